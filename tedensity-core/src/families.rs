//! Normalization of transposable element family and subfamily labels.
//!
//! Annotation pipelines spell the same classes several ways (`MuDR`,
//! `MULE-MuDR`, `Mutator|cleanup`, ...). Labels are folded onto one spelling so
//! later aggregation groups them together. Labels without an entry pass through.

pub const UNKNOWN_FAMILY: &str = "Unknown";
pub const UNKNOWN_SUBFAMILY: &str = "Unknown_SubFam";

/// Families removed entirely on import.
pub const DROPPED_FAMILIES: &[&str] = &["Simple_repeat"];

pub fn normalize_family(family: &str) -> &str {
    match family {
        "RC?" | "RC" => "DNA",
        "SINE?" | "No_hits" => UNKNOWN_FAMILY,
        "tandem" => "Tandem",
        other => other,
    }
}

pub fn normalize_subfamily(subfamily: &str) -> &str {
    match subfamily {
        "" | "Uknown" | "unknown" | "TcMar" | "TcMar-Pogo" | "Pao" | "Caulimovirus"
        | "Helitron" | "Maverick" | "Micro_like" | "Micro-like-sequence"
        | "Micro-like-sequence|cleanup" | "Unclassified" | "Tad1" => UNKNOWN_SUBFAMILY,
        "MuDr" | "MuDR" | "MULE-MuDR" | "MuLE-MuDR" | "Mutator" | "Mutator|cleanup" => "MULE",
        "hAT-Tag1" | "hAT-Tip100" | "hAT-Charlie" | "hAT-Ac" | "hAT|cleanup" => "hAT",
        "CR1" | "L1" | "L2" | "L1-Tx1" | "Jockey" | "CRE" | "Line" => "LINE",
        "Harbinger" => "PIF-Harbinger",
        "CACTA" => "CMC-EnSpm",
        other => other,
    }
}

pub fn is_dropped_family(family: &str) -> bool {
    DROPPED_FAMILIES.contains(&family)
}
