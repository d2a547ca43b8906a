use crate::data::TagUniverse;
use crate::engines::generation::random::RandomStream;
use crate::types::{Tag, TagKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight of an industry slot when picking where a subtree starts.
const INDUSTRY_SLOT_WEIGHT: f64 = 0.9;
/// Weight of a universe slot when picking where a subtree starts.
const UNIVERSE_SLOT_WEIGHT: f64 = 0.1;

/// Deduplicated item list of a candidate program.
///
/// No two items share a name. Items are kept sorted by `(kind, name)` so that
/// index ranges picked by the operators are reproducible for a given set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<Tag>);

/// Result of a crossover: the child plus the positions needed for lineage.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverOutput {
    pub child: TagSet,
    /// Positions of the receiving parent that were cut out.
    pub removed: Vec<usize>,
    /// Positions of the donor that were spliced in.
    pub donor_kept: Vec<usize>,
}

/// Result of a single-parent operator.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutput {
    pub child: TagSet,
    /// Removed positions (subtree/hoist) or replaced positions (point).
    pub positions: Vec<usize>,
}

impl TagSet {
    /// Collapse `tags` to one item per name. Each surviving name takes the kind
    /// the universe assigns to it (industry first); unknown names keep their own.
    pub fn from_tags<I>(tags: I, universe: &TagUniverse) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut by_name: BTreeMap<String, TagKind> = BTreeMap::new();
        for tag in tags {
            let kind = universe.kind_of(&tag.name).unwrap_or(tag.kind);
            by_name.entry(tag.name).or_insert(kind);
        }
        let mut items: Vec<Tag> = by_name
            .into_iter()
            .map(|(name, kind)| Tag { kind, name })
            .collect();
        items.sort();
        Self(items)
    }

    /// Random program: one industry and one universe tag, plus every other tag
    /// with a per-kind inclusion probability drawn from `init_depth`.
    pub fn build_random(
        universe: &TagUniverse,
        init_depth: (usize, usize),
        rng: &mut RandomStream,
    ) -> Self {
        let industries = universe.industry_tags();
        let universes = universe.universe_tags();

        let ind_prob = inclusion_probability(industries.len(), init_depth.1, rng);
        let universe_prob = inclusion_probability(universes.len(), init_depth.1, rng);

        let mut picked = Vec::with_capacity(2 + init_depth.1 * 2);
        if let Some(tag) = rng.choose(industries) {
            picked.push(tag.clone());
        }
        if let Some(tag) = rng.choose(universes) {
            picked.push(tag.clone());
        }
        for tag in industries {
            if rng.next_uniform() < ind_prob {
                picked.push(tag.clone());
            }
        }
        for tag in universes {
            if rng.next_uniform() < universe_prob {
                picked.push(tag.clone());
            }
        }

        Self::from_tags(picked, universe)
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|tag| tag.name == name)
    }

    /// Names in lexicographic order.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(|tag| tag.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// 128-bit BLAKE3 digest (hex) of the sorted, concatenated names.
    pub fn identity(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for name in self.sorted_names() {
            hasher.update(name.as_bytes());
        }
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..32].to_string()
    }

    /// Half-open `[start, end)` range biased toward industry slots.
    pub fn get_subtree(&self, rng: &mut RandomStream) -> (usize, usize) {
        subtree_range(&self.0, rng)
    }

    /// Replace a subtree of `self` with a subtree of `donor`.
    pub fn crossover(
        &self,
        donor: &TagSet,
        universe: &TagUniverse,
        rng: &mut RandomStream,
    ) -> CrossoverOutput {
        let (start, end) = self.get_subtree(rng);
        let (donor_start, donor_end) = donor.get_subtree(rng);

        let spliced = self.0[..start]
            .iter()
            .chain(&donor.0[donor_start..donor_end])
            .chain(&self.0[end..])
            .cloned();

        CrossoverOutput {
            child: Self::from_tags(spliced, universe),
            removed: (start..end).collect(),
            donor_kept: (donor_start..donor_end).collect(),
        }
    }

    /// Crossover against a freshly built random program.
    pub fn subtree_mutation(
        &self,
        universe: &TagUniverse,
        init_depth: (usize, usize),
        rng: &mut RandomStream,
    ) -> MutationOutput {
        let fresh = Self::build_random(universe, init_depth, rng);
        let CrossoverOutput { child, removed, .. } = self.crossover(&fresh, universe, rng);
        MutationOutput {
            child,
            positions: removed,
        }
    }

    /// Replace a subtree with a subtree nested inside it.
    pub fn hoist_mutation(&self, universe: &TagUniverse, rng: &mut RandomStream) -> MutationOutput {
        let (start, end) = self.get_subtree(rng);
        let outer = &self.0[start..end];
        let (inner_start, inner_end) = subtree_range(outer, rng);
        let hoisted = &outer[inner_start..inner_end];

        let kept = (start + inner_start)..(start + inner_end);
        let removed = (start..end).filter(|i| !kept.contains(i)).collect();

        let spliced = self.0[..start]
            .iter()
            .chain(hoisted)
            .chain(&self.0[end..])
            .cloned();

        MutationOutput {
            child: Self::from_tags(spliced, universe),
            positions: removed,
        }
    }

    /// Swap each item, with probability `p_replace`, for another tag of the same kind.
    pub fn point_mutation(
        &self,
        universe: &TagUniverse,
        p_replace: f64,
        rng: &mut RandomStream,
    ) -> MutationOutput {
        let mut tags = self.0.clone();
        let mut mutated = Vec::new();

        for (i, tag) in tags.iter_mut().enumerate() {
            if rng.next_uniform() >= p_replace {
                continue;
            }
            let alternatives: Vec<&Tag> = universe
                .tags_of(tag.kind)
                .iter()
                .filter(|candidate| candidate.name != tag.name)
                .collect();
            if let Some(replacement) = rng.choose(&alternatives) {
                *tag = (*replacement).clone();
                mutated.push(i);
            }
        }

        MutationOutput {
            child: Self::from_tags(tags, universe),
            positions: mutated,
        }
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn inclusion_probability(available: usize, max_depth: usize, rng: &mut RandomStream) -> f64 {
    if available == 0 {
        return 0.0;
    }
    let cap = max_depth.min(available) as i64;
    rng.next_int(0, cap) as f64 / available as f64
}

fn subtree_range(items: &[Tag], rng: &mut RandomStream) -> (usize, usize) {
    let len = items.len();
    if len == 0 {
        return (0, 0);
    }

    let weights: Vec<f64> = items
        .iter()
        .map(|tag| {
            if tag.is_industry() {
                INDUSTRY_SLOT_WEIGHT
            } else {
                UNIVERSE_SLOT_WEIGHT
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    let target = rng.next_uniform() * total;

    let mut cumulative = 0.0;
    let start = weights
        .iter()
        .position(|w| {
            cumulative += w;
            target < cumulative
        })
        .unwrap_or(len - 1);

    let end = if start >= len - 1 {
        start
    } else {
        rng.next_int(start as i64, len as i64) as usize
    };
    (start, end)
}

/// How a candidate came to be. Indices refer to the parent population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineageInfo {
    Seed,
    Crossover {
        parent_idx: usize,
        parent_removed_positions: Vec<usize>,
        donor_idx: usize,
        donor_kept_positions: Vec<usize>,
    },
    SubtreeMutation {
        parent_idx: usize,
        removed_positions: Vec<usize>,
    },
    HoistMutation {
        parent_idx: usize,
        removed_positions: Vec<usize>,
    },
    PointMutation {
        parent_idx: usize,
        mutated_positions: Vec<usize>,
    },
    Reproduction {
        parent_idx: usize,
    },
}

impl LineageInfo {
    pub fn method(&self) -> &'static str {
        match self {
            LineageInfo::Seed => "seed",
            LineageInfo::Crossover { .. } => "crossover",
            LineageInfo::SubtreeMutation { .. } => "subtree_mutation",
            LineageInfo::HoistMutation { .. } => "hoist_mutation",
            LineageInfo::PointMutation { .. } => "point_mutation",
            LineageInfo::Reproduction { .. } => "reproduction",
        }
    }

    pub fn parent_idx(&self) -> Option<usize> {
        match self {
            LineageInfo::Seed => None,
            LineageInfo::Crossover { parent_idx, .. }
            | LineageInfo::SubtreeMutation { parent_idx, .. }
            | LineageInfo::HoistMutation { parent_idx, .. }
            | LineageInfo::PointMutation { parent_idx, .. }
            | LineageInfo::Reproduction { parent_idx } => Some(*parent_idx),
        }
    }
}

/// One individual of the search: a tag set plus lineage and its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    items: TagSet,
    identity: String,
    generation: u64,
    lineage: LineageInfo,
    created_at: DateTime<Utc>,
    fitness: Option<f64>,
    valid: bool,
}

impl Candidate {
    pub fn new(items: TagSet, generation: u64, lineage: LineageInfo) -> Self {
        let identity = items.identity();
        Self {
            items,
            identity,
            generation,
            lineage,
            created_at: Utc::now(),
            fitness: None,
            valid: false,
        }
    }

    pub fn build_random(
        universe: &TagUniverse,
        init_depth: (usize, usize),
        generation: u64,
        rng: &mut RandomStream,
    ) -> Self {
        Self::new(
            TagSet::build_random(universe, init_depth, rng),
            generation,
            LineageInfo::Seed,
        )
    }

    /// Same item set under a `Reproduction` lineage.
    pub fn reproduce(&self, parent_idx: usize, generation: u64) -> Self {
        Self::new(
            self.items.clone(),
            generation,
            LineageInfo::Reproduction { parent_idx },
        )
    }

    /// Attach the evaluation outcome. Consumes the candidate so a score is set once.
    pub fn with_evaluation(mut self, fitness: f64, valid: bool) -> Self {
        self.fitness = Some(fitness);
        self.valid = valid;
        self
    }

    pub fn items(&self) -> &TagSet {
        &self.items
    }

    pub fn tags(&self) -> &[Tag] {
        self.items.as_slice()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lineage(&self) -> &LineageInfo {
        &self.lineage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
