//! Catalog of explorer tools.
//!
//! Tool identifiers are a closed enum so lookups are exhaustive-checked at
//! compile time; the metadata itself is inert configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Analysis,
    Health,
    Longevity,
    Ancestry,
    Simulation,
}

impl ToolCategory {
    pub const ALL: &'static [ToolCategory] = &[
        ToolCategory::Analysis,
        ToolCategory::Health,
        ToolCategory::Longevity,
        ToolCategory::Ancestry,
        ToolCategory::Simulation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolCategory::Analysis => "Analysis",
            ToolCategory::Health => "Health",
            ToolCategory::Longevity => "Longevity",
            ToolCategory::Ancestry => "Ancestry",
            ToolCategory::Simulation => "Simulation",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Basic,
    Intermediate,
    Advanced,
}

impl Complexity {
    pub fn label(self) -> &'static str {
        match self {
            Complexity::Basic => "basic",
            Complexity::Intermediate => "intermediate",
            Complexity::Advanced => "advanced",
        }
    }
}

/// Static metadata describing one catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ToolMeta {
    pub id: ToolId,
    pub slug: &'static str,
    pub name: &'static str,
    pub category: ToolCategory,
    pub complexity: Complexity,
    pub premium: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolId {
    VariantAnalyzer,
    BatchAnalyzer,
    SplicingPredictor,
    GenomeComparator,
    RegulatoryNetworks,
    RareVariantsNetwork,
    BeneficialVariantsLibrary,
    GeneticDiet,
    Pharmacogenomics,
    ImmuneResponsePredictor,
    FamilyRiskAssessment,
    MicrobiomeConnector,
    DrugTargetFinder,
    GeneTherapyCompanion,
    EpigeneticCoach,
    AgingPredictor,
    EpigeneticClock,
    AgingErrorCorrector,
    FutureSimulator,
    CapabilitiesOptimizer,
    AncestryExplorer,
    TreeOfLife,
    GeneticDetective,
    MyDnaPersonal,
    CoupleCompatibility,
    CrisprSimulator,
    EvolutionSimulator,
    OrganismDesigner,
    VirtualLab,
    MindGenomeConnector,
    GeneticSuperpowers,
}

impl ToolId {
    pub const ALL: &'static [ToolId] = &[
        ToolId::VariantAnalyzer,
        ToolId::BatchAnalyzer,
        ToolId::SplicingPredictor,
        ToolId::GenomeComparator,
        ToolId::RegulatoryNetworks,
        ToolId::RareVariantsNetwork,
        ToolId::BeneficialVariantsLibrary,
        ToolId::GeneticDiet,
        ToolId::Pharmacogenomics,
        ToolId::ImmuneResponsePredictor,
        ToolId::FamilyRiskAssessment,
        ToolId::MicrobiomeConnector,
        ToolId::DrugTargetFinder,
        ToolId::GeneTherapyCompanion,
        ToolId::EpigeneticCoach,
        ToolId::AgingPredictor,
        ToolId::EpigeneticClock,
        ToolId::AgingErrorCorrector,
        ToolId::FutureSimulator,
        ToolId::CapabilitiesOptimizer,
        ToolId::AncestryExplorer,
        ToolId::TreeOfLife,
        ToolId::GeneticDetective,
        ToolId::MyDnaPersonal,
        ToolId::CoupleCompatibility,
        ToolId::CrisprSimulator,
        ToolId::EvolutionSimulator,
        ToolId::OrganismDesigner,
        ToolId::VirtualLab,
        ToolId::MindGenomeConnector,
        ToolId::GeneticSuperpowers,
    ];

    pub fn from_slug(slug: &str) -> Option<ToolId> {
        ToolId::ALL.iter().copied().find(|t| t.slug() == slug)
    }

    pub fn slug(self) -> &'static str {
        self.meta().slug
    }

    pub fn meta(self) -> ToolMeta {
        use Complexity::{Advanced, Basic, Intermediate};
        use ToolCategory::{Analysis, Ancestry, Health, Longevity, Simulation};

        let (slug, name, category, complexity, premium, description) = match self {
            ToolId::VariantAnalyzer => (
                "variant-analyzer",
                "Variant Analyzer",
                Analysis,
                Intermediate,
                false,
                "Predict the regulatory effect of a single variant",
            ),
            ToolId::BatchAnalyzer => (
                "batch-analyzer",
                "Batch Analyzer",
                Analysis,
                Advanced,
                false,
                "Analyze a list of variants sequentially",
            ),
            ToolId::SplicingPredictor => (
                "splicing-predictor",
                "Splicing Predictor",
                Analysis,
                Advanced,
                false,
                "Predict splice-site disruption",
            ),
            ToolId::GenomeComparator => (
                "genome-comparator",
                "Genome Comparator",
                Analysis,
                Intermediate,
                false,
                "Compare variant effects across genomes",
            ),
            ToolId::RegulatoryNetworks => (
                "regulatory-networks",
                "Regulatory Networks",
                Analysis,
                Advanced,
                true,
                "Map variants onto regulatory networks",
            ),
            ToolId::RareVariantsNetwork => (
                "rare-variants-network",
                "Rare Variants Network",
                Analysis,
                Advanced,
                true,
                "Connect carriers of rare variants",
            ),
            ToolId::BeneficialVariantsLibrary => (
                "beneficial-variants-library",
                "Beneficial Variants Library",
                Analysis,
                Basic,
                false,
                "Browse variants with documented benefits",
            ),
            ToolId::GeneticDiet => (
                "genetic-diet",
                "Genetic Diet",
                Health,
                Basic,
                false,
                "Diet guidance from metabolism genetics",
            ),
            ToolId::Pharmacogenomics => (
                "pharmacogenomics",
                "Pharmacogenomics",
                Health,
                Intermediate,
                false,
                "Drug response prediction from genotype",
            ),
            ToolId::ImmuneResponsePredictor => (
                "immune-response-predictor",
                "Immune Response Predictor",
                Health,
                Intermediate,
                false,
                "Predict immune response profiles",
            ),
            ToolId::FamilyRiskAssessment => (
                "family-risk-assessment",
                "Family Risk Assessment",
                Health,
                Intermediate,
                false,
                "Inherited risk across a family tree",
            ),
            ToolId::MicrobiomeConnector => (
                "microbiome-connector",
                "Microbiome Connector",
                Health,
                Intermediate,
                false,
                "Link host genetics to microbiome traits",
            ),
            ToolId::DrugTargetFinder => (
                "drug-target-finder",
                "Drug Target Finder",
                Health,
                Advanced,
                true,
                "Find druggable targets near a variant",
            ),
            ToolId::GeneTherapyCompanion => (
                "gene-therapy-companion",
                "Gene Therapy Companion",
                Health,
                Advanced,
                true,
                "Plan gene-therapy edits",
            ),
            ToolId::EpigeneticCoach => (
                "epigenetic-coach",
                "Epigenetic Coach",
                Health,
                Basic,
                false,
                "Lifestyle guidance from epigenetic markers",
            ),
            ToolId::AgingPredictor => (
                "aging-predictor",
                "Aging Predictor",
                Longevity,
                Intermediate,
                false,
                "Project aging trajectories",
            ),
            ToolId::EpigeneticClock => (
                "epigenetic-clock",
                "Epigenetic Clock",
                Longevity,
                Intermediate,
                false,
                "Estimate biological age",
            ),
            ToolId::AgingErrorCorrector => (
                "aging-error-corrector",
                "Aging Error Corrector",
                Longevity,
                Advanced,
                true,
                "Simulate repair of age-related damage",
            ),
            ToolId::FutureSimulator => (
                "future-simulator",
                "Future Simulator",
                Longevity,
                Basic,
                false,
                "Simulate long-term health scenarios",
            ),
            ToolId::CapabilitiesOptimizer => (
                "capabilities-optimizer",
                "Capabilities Optimizer",
                Longevity,
                Intermediate,
                true,
                "Optimize training around genetic capabilities",
            ),
            ToolId::AncestryExplorer => (
                "ancestry-explorer",
                "Ancestry Explorer",
                Ancestry,
                Basic,
                false,
                "Explore ancestral origins",
            ),
            ToolId::TreeOfLife => (
                "tree-of-life",
                "Tree of Life",
                Ancestry,
                Basic,
                false,
                "Place sequences on the tree of life",
            ),
            ToolId::GeneticDetective => (
                "genetic-detective",
                "Genetic Detective",
                Ancestry,
                Intermediate,
                false,
                "Trace relatedness from shared variants",
            ),
            ToolId::MyDnaPersonal => (
                "my-dna-personal",
                "My DNA",
                Ancestry,
                Basic,
                false,
                "Personal genome walkthrough",
            ),
            ToolId::CoupleCompatibility => (
                "couple-compatibility",
                "Couple Compatibility",
                Ancestry,
                Basic,
                false,
                "Carrier screening for couples",
            ),
            ToolId::CrisprSimulator => (
                "crispr-simulator",
                "CRISPR Simulator",
                Simulation,
                Advanced,
                false,
                "Simulate CRISPR edits and outcomes",
            ),
            ToolId::EvolutionSimulator => (
                "evolution-simulator",
                "Evolution Simulator",
                Simulation,
                Intermediate,
                false,
                "Run selection over simulated populations",
            ),
            ToolId::OrganismDesigner => (
                "organism-designer",
                "Organism Designer",
                Simulation,
                Advanced,
                true,
                "Design traits for a synthetic organism",
            ),
            ToolId::VirtualLab => (
                "virtual-lab",
                "Virtual Lab",
                Simulation,
                Intermediate,
                false,
                "Run virtual bench experiments",
            ),
            ToolId::MindGenomeConnector => (
                "mind-genome-connector",
                "Mind-Genome Connector",
                Simulation,
                Advanced,
                true,
                "Relate cognition traits to genotype",
            ),
            ToolId::GeneticSuperpowers => (
                "genetic-superpowers",
                "Genetic Superpowers",
                Simulation,
                Basic,
                false,
                "Discover rare advantageous traits",
            ),
        };

        ToolMeta {
            id: self,
            slug,
            name,
            category,
            complexity,
            premium,
            description,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Number of catalog entries per category, in category order.
pub fn category_counts() -> Vec<(ToolCategory, usize)> {
    ToolCategory::ALL
        .iter()
        .map(|&cat| {
            let n = ToolId::ALL
                .iter()
                .filter(|t| t.meta().category == cat)
                .count();
            (cat, n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for &tool in ToolId::ALL {
            assert_eq!(ToolId::from_slug(tool.slug()), Some(tool));
        }
        assert_eq!(ToolId::from_slug("no-such-tool"), None);
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<&str> = ToolId::ALL.iter().map(|t| t.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), ToolId::ALL.len());
    }

    #[test]
    fn category_counts_cover_the_catalog() {
        let counts = category_counts();
        assert_eq!(counts.len(), ToolCategory::ALL.len());
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        assert_eq!(total, ToolId::ALL.len());
        assert!(counts.iter().all(|(_, n)| *n > 0));
    }
}
