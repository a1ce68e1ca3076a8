//! Per-format keyword sets for filename metadata
//!
//! Each field maps lowercase filename tokens to the canonical value stored in
//! the metadata. Fields are listed in priority order; within a field the
//! first token found in the file name wins.

use seqsleuth_common::FileFormat;

/// One metadata field recognizable from file name tokens
#[derive(Debug)]
pub struct KeywordField {
    pub name: &'static str,
    pub keywords: &'static [(&'static str, &'static str)],
}

/// The fields a filename may describe for one format
#[derive(Debug)]
pub struct KeywordSet {
    pub format: FileFormat,
    pub fields: &'static [KeywordField],
}

const PLATFORM: KeywordField = KeywordField {
    name: "platform",
    keywords: &[
        ("illumina", "Illumina"),
        ("novaseq", "Illumina"),
        ("hiseq", "Illumina"),
        ("hiseqx", "Illumina"),
        ("nextseq", "Illumina"),
        ("pacbio", "PacBio"),
        ("hifi", "PacBio"),
        ("ccs", "PacBio"),
        ("sequel", "PacBio"),
        ("sequelii", "PacBio"),
        ("revio", "PacBio"),
        ("ont", "ONT"),
        ("nanopore", "ONT"),
        ("promethion", "ONT"),
        ("minion", "ONT"),
        ("bgi", "MGI"),
        ("mgi", "MGI"),
        ("dnbseq", "MGI"),
        ("element", "Element"),
        ("aviti", "Element"),
        ("ultima", "Ultima"),
        ("solid", "SOLiD"),
        ("454", "454"),
        ("iontorrent", "Ion Torrent"),
        ("10x", "10x Genomics"),
    ],
};

const REFERENCE_BUILD: KeywordField = KeywordField {
    name: "reference_build",
    keywords: &[
        ("grch38", "GRCh38"),
        ("hg38", "GRCh38"),
        ("grch37", "GRCh37"),
        ("hg19", "GRCh37"),
        ("hs37d5", "GRCh37"),
        ("b37", "GRCh37"),
        ("chm13", "CHM13"),
        ("t2t", "CHM13"),
    ],
};

const LIBRARY_STRATEGY: KeywordField = KeywordField {
    name: "library_strategy",
    keywords: &[
        ("wgs", "WGS"),
        ("wes", "WES"),
        ("exome", "WES"),
        ("rnaseq", "RNA-Seq"),
        ("hic", "Hi-C"),
        ("matepair", "Mate-Pair"),
        ("mp", "Mate-Pair"),
        ("pcrfree", "PCR-free"),
        ("ultralong", "Ultra-long"),
        ("ul", "Ultra-long"),
        ("duplex", "Duplex"),
    ],
};

const READ_PAIR: KeywordField = KeywordField {
    name: "read_pair",
    keywords: &[("r1", "R1"), ("r2", "R2"), ("1", "R1"), ("2", "R2")],
};

const ALIGNER: KeywordField = KeywordField {
    name: "aligner",
    keywords: &[
        ("bwa", "bwa"),
        ("bwamem", "bwa-mem"),
        ("minimap2", "minimap2"),
        ("pbmm2", "pbmm2"),
        ("ngmlr", "ngmlr"),
        ("winnowmap", "winnowmap"),
        ("novoalign", "novoalign"),
        ("isaac", "Isaac"),
        ("dragen", "DRAGEN"),
        ("bowtie2", "bowtie2"),
    ],
};

const DUPLICATES: KeywordField = KeywordField {
    name: "duplicates",
    keywords: &[
        ("markdup", "marked"),
        ("dedup", "marked"),
        ("dupmarked", "marked"),
        ("rmdup", "removed"),
    ],
};

const VARIANT_CALLER: KeywordField = KeywordField {
    name: "variant_caller",
    keywords: &[
        ("deepvariant", "DeepVariant"),
        ("gatk", "GATK"),
        ("haplotypecaller", "GATK"),
        ("freebayes", "FreeBayes"),
        ("strelka", "Strelka2"),
        ("strelka2", "Strelka2"),
        ("dragen", "DRAGEN"),
        ("clair3", "Clair3"),
        ("pepper", "PEPPER"),
        ("longshot", "Longshot"),
        ("sniffles", "Sniffles"),
        ("pbsv", "pbsv"),
        ("cutesv", "cuteSV"),
        ("svim", "SVIM"),
        ("manta", "Manta"),
        ("dipcall", "dipcall"),
    ],
};

const VARIANT_TYPE: KeywordField = KeywordField {
    name: "variant_type",
    keywords: &[
        ("snv", "SNV"),
        ("snp", "SNV"),
        ("snps", "SNV"),
        ("indel", "INDEL"),
        ("indels", "INDEL"),
        ("smallvar", "small"),
        ("small", "small"),
        ("sv", "SV"),
        ("svs", "SV"),
        ("cnv", "CNV"),
    ],
};

const CALLSET_ROLE: KeywordField = KeywordField {
    name: "callset_role",
    keywords: &[
        ("benchmark", "benchmark"),
        ("highconf", "high-confidence"),
        ("truth", "truth"),
        ("draft", "draft"),
        ("phased", "phased"),
    ],
};

pub static FASTQ_KEYWORDS: KeywordSet = KeywordSet {
    format: FileFormat::Fastq,
    fields: &[PLATFORM, LIBRARY_STRATEGY, READ_PAIR],
};

pub static BAM_KEYWORDS: KeywordSet = KeywordSet {
    format: FileFormat::Bam,
    fields: &[PLATFORM, REFERENCE_BUILD, ALIGNER, LIBRARY_STRATEGY, DUPLICATES],
};

pub static VCF_KEYWORDS: KeywordSet = KeywordSet {
    format: FileFormat::Vcf,
    fields: &[
        PLATFORM,
        REFERENCE_BUILD,
        VARIANT_CALLER,
        VARIANT_TYPE,
        CALLSET_ROLE,
    ],
};

/// Keyword set used for files of `format`
pub fn for_format(format: FileFormat) -> &'static KeywordSet {
    match format {
        FileFormat::Fastq => &FASTQ_KEYWORDS,
        FileFormat::Bam => &BAM_KEYWORDS,
        FileFormat::Vcf => &VCF_KEYWORDS,
    }
}
