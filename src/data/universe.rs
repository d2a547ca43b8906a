use crate::config::TagCatalog;
use crate::error::{GenticError, Result};
use crate::types::{Tag, TagKind};
use std::collections::{BTreeSet, HashMap};

/// Read-only catalog of every industry and universe tag the search may use.
///
/// Built once before a run. The name index resolves a bare name to its kind,
/// checking industries first, so a name listed under both kinds is an industry tag.
#[derive(Debug, Clone)]
pub struct TagUniverse {
    industries: Vec<Tag>,
    universes: Vec<Tag>,
    kinds: HashMap<String, TagKind>,
}

impl TagUniverse {
    pub fn new<I, U, S, T>(industries: I, universes: U) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        U: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let industry_names: BTreeSet<String> = industries.into_iter().map(Into::into).collect();
        let universe_names: BTreeSet<String> = universes.into_iter().map(Into::into).collect();

        if industry_names.is_empty() && universe_names.is_empty() {
            return Err(GenticError::Tag(
                "Tag universe needs at least one industry or universe tag".to_string(),
            ));
        }
        if let Some(blank) = industry_names
            .iter()
            .chain(universe_names.iter())
            .find(|name| name.trim().is_empty())
        {
            return Err(GenticError::Tag(format!("Blank tag name {:?}", blank)));
        }

        let mut kinds = HashMap::with_capacity(industry_names.len() + universe_names.len());
        for name in &universe_names {
            kinds.insert(name.clone(), TagKind::Universe);
        }
        // Industry wins when a name appears in both lists
        for name in &industry_names {
            kinds.insert(name.clone(), TagKind::Industry);
        }

        Ok(Self {
            industries: industry_names.into_iter().map(Tag::industry).collect(),
            universes: universe_names.into_iter().map(Tag::universe).collect(),
            kinds,
        })
    }

    pub fn from_catalog(catalog: &TagCatalog) -> Result<Self> {
        Self::new(catalog.industries.iter().cloned(), catalog.universes.iter().cloned())
    }

    pub fn industry_tags(&self) -> &[Tag] {
        &self.industries
    }

    pub fn universe_tags(&self) -> &[Tag] {
        &self.universes
    }

    pub fn tags_of(&self, kind: TagKind) -> &[Tag] {
        match kind {
            TagKind::Industry => &self.industries,
            TagKind::Universe => &self.universes,
        }
    }

    /// Kind a name resolves to, industry first.
    pub fn kind_of(&self, name: &str) -> Option<TagKind> {
        self.kinds.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Option<Tag> {
        self.kind_of(name).map(|kind| Tag::new(kind, name))
    }

    pub fn len(&self) -> usize {
        self.industries.len() + self.universes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
