//! # Hashtag Taxonomy
//!
//! The closed set of hashtags a post may carry. Tag-selection collaborators
//! choose from a per-content-type candidate pool; anything they return that
//! is not in this table is discarded.

use crate::content::ContentType;

/// Added to every generated tag line.
pub const MANDATORY_TAG: &str = "#BHTLabs";

/// Maximum tags on a generated line, mandatory tag included.
pub const MAX_TAGS: usize = 5;

/// Used verbatim when tag generation fails outright.
pub const FALLBACK_TAG_LINE: &str = "#BHTLabs #FederalIT #GovTech #DataAnalytics";

const SECTIONS: &[(&str, &[&str])] = &[
    (
        "identity",
        &["#BHTLabs", "#BHT", "#FederalIT", "#SmallBusiness", "#8a", "#SDVOSB"],
    ),
    (
        "federal",
        &[
            "#FederalContracting",
            "#GovTech",
            "#PublicSector",
            "#FedTech",
            "#DoD",
            "#CivDiv",
            "#FederalAgency",
            "#FederalAcquisition",
            "#ContractVehicle",
            "#NAICS",
            "#SetAside",
        ],
    ),
    (
        "data",
        &[
            "#DataAnalytics",
            "#DataEngineering",
            "#DataStrategy",
            "#ETL",
            "#DataPipeline",
            "#DataGovernance",
            "#DataQuality",
            "#MasterDataManagement",
            "#BusinessIntelligence",
            "#DataWarehouse",
            "#DataLake",
        ],
    ),
    (
        "cloud",
        &[
            "#CloudMigration",
            "#AWS",
            "#Azure",
            "#GovCloud",
            "#FedRAMP",
            "#CloudFirst",
            "#HybridCloud",
            "#CloudNative",
        ],
    ),
    (
        "ai",
        &[
            "#ArtificialIntelligence",
            "#MachineLearning",
            "#AI",
            "#GenerativeAI",
            "#FederalAI",
            "#ResponsibleAI",
            "#AIGovernance",
            "#NLP",
        ],
    ),
    (
        "cybersecurity",
        &[
            "#Cybersecurity",
            "#ZeroTrust",
            "#CMMC",
            "#FedRAMP",
            "#FISMA",
            "#DataSecurity",
            "#InfoSec",
            "#CyberResilience",
        ],
    ),
    (
        "it_modernization",
        &[
            "#ITModernization",
            "#DigitalTransformation",
            "#LegacyMigration",
            "#Agile",
            "#DevSecOps",
            "#TechModernization",
            "#FederalModernization",
        ],
    ),
    (
        "leadership",
        &[
            "#Leadership",
            "#Entrepreneurship",
            "#SmallBizOwner",
            "#WomenInTech",
            "#VeteranOwned",
            "#FounderStory",
            "#GovCon",
            "#B2G",
        ],
    ),
    (
        "compliance",
        &[
            "#Compliance",
            "#RegulatoryCompliance",
            "#ITAR",
            "#FAR",
            "#DFARS",
            "#Section508",
            "#ADA",
            "#RiskManagement",
        ],
    ),
];

/// Tags in a named section, or `None` for an unknown section.
pub fn section(name: &str) -> Option<&'static [&'static str]> {
    SECTIONS
        .iter()
        .find(|(section, _)| *section == name)
        .map(|(_, tags)| *tags)
}

/// Sections relevant to a content type, in priority order.
pub fn sections_for(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::ProductLaunch => &["identity", "it_modernization", "ai", "federal"],
        ContentType::CaseStudy => &["identity", "data", "federal", "compliance"],
        ContentType::Vision => &["identity", "leadership", "federal", "it_modernization"],
        ContentType::Proof => &["identity", "data", "compliance", "federal"],
        ContentType::Insight => &["identity", "leadership", "it_modernization", "ai"],
        ContentType::Educational => &["identity", "data", "cloud", "it_modernization"],
        ContentType::ThoughtLeadership => {
            &["identity", "leadership", "federal", "it_modernization"]
        }
        ContentType::General => &["identity", "federal", "leadership"],
    }
}

/// The candidate pool offered to a tag-selection collaborator: the
/// content type's sections flattened, first occurrence kept.
pub fn candidate_pool(content_type: ContentType) -> Vec<&'static str> {
    let mut pool: Vec<&'static str> = Vec::new();
    for name in sections_for(content_type) {
        for &tag in section(name).unwrap_or(&[]) {
            if !pool.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                pool.push(tag);
            }
        }
    }
    pool
}

/// Look a tag up case-insensitively, with or without its leading `#`,
/// returning the taxonomy's own spelling.
pub fn canonical(tag: &str) -> Option<&'static str> {
    let bare = tag.trim().trim_start_matches('#');
    if bare.is_empty() {
        return None;
    }
    SECTIONS
        .iter()
        .flat_map(|(_, tags)| tags.iter())
        .find(|known| known[1..].eq_ignore_ascii_case(bare))
        .copied()
}
