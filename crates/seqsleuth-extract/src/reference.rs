//! Human reference build detection from contig dictionaries and names

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceBuild {
    Grch37,
    Grch38,
    Chm13,
}

impl ReferenceBuild {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceBuild::Grch37 => "GRCh37",
            ReferenceBuild::Grch38 => "GRCh38",
            ReferenceBuild::Chm13 => "CHM13",
        }
    }
}

/// Chromosome 1 length per build
const CHR1_LENGTHS: [(u64, ReferenceBuild); 3] = [
    (249_250_621, ReferenceBuild::Grch37),
    (248_956_422, ReferenceBuild::Grch38),
    (248_387_328, ReferenceBuild::Chm13),
];

/// Name fragments seen in reference paths and assembly tags, checked in order
const NAME_HINTS: [(&str, ReferenceBuild); 9] = [
    ("chm13", ReferenceBuild::Chm13),
    ("t2t", ReferenceBuild::Chm13),
    ("grch38", ReferenceBuild::Grch38),
    ("hg38", ReferenceBuild::Grch38),
    ("grch37", ReferenceBuild::Grch37),
    ("hs37d5", ReferenceBuild::Grch37),
    ("hg19", ReferenceBuild::Grch37),
    ("g1k_v37", ReferenceBuild::Grch37),
    ("b37", ReferenceBuild::Grch37),
];

/// Guess the build from the length of chromosome 1 (`1` or `chr1`)
pub fn guess_from_contigs<'a, I>(contigs: I) -> Option<ReferenceBuild>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    contigs
        .into_iter()
        .find(|(name, _)| matches!(*name, "1" | "chr1"))
        .and_then(|(_, length)| {
            CHR1_LENGTHS
                .iter()
                .find(|(known, _)| *known == length)
                .map(|(_, build)| *build)
        })
}

/// Guess the build from a reference file name or assembly tag
pub fn guess_from_name(name: &str) -> Option<ReferenceBuild> {
    let lowered = name.to_ascii_lowercase();
    NAME_HINTS
        .iter()
        .find(|(hint, _)| lowered.contains(hint))
        .map(|(_, build)| *build)
}
