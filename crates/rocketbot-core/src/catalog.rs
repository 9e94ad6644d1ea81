//! Factor-pair catalog.
//!
//! The game reveals the factor pairs of a number one at a time. Rather than
//! factoring at runtime, the bot diffs what is already on screen against a
//! precomputed enumeration and types the first pair still missing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::error::{CatalogError, SolveError, SolveResult};

/// An unordered factor pair, stored smaller-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactorPair {
    small: u32,
    large: u32,
}

impl FactorPair {
    /// Build a pair from two factors given in either order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            small: a.min(b),
            large: a.max(b),
        }
    }

    pub fn small(&self) -> u32 {
        self.small
    }

    pub fn large(&self) -> u32 {
        self.large
    }

    pub fn product(&self) -> u64 {
        u64::from(self.small) * u64::from(self.large)
    }
}

impl std::fmt::Display for FactorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.small, self.large)
    }
}

impl FromStr for FactorPair {
    type Err = CatalogError;

    /// Parses `"AxB"`; `x`, `X` and `×` are accepted as separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CatalogError::Parse(format!("bad factor pair {s:?}"));
        let (a, b) = s.split_once(['x', 'X', '×']).ok_or_else(bad)?;
        let a = a.trim().parse().map_err(|_| bad())?;
        let b = b.trim().parse().map_err(|_| bad())?;
        Ok(Self::new(a, b))
    }
}

/// What to do next for a factors puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Type this pair, smaller factor first.
    TypePair(u32, u32),
    /// Every pair is on screen (primes included); submit the checkmark.
    Complete,
}

/// Both accepted dataset layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Entries(Vec<EntryDocument>),
    Map(BTreeMap<String, Vec<String>>),
}

#[derive(Deserialize)]
struct EntryDocument {
    number: u32,
    factors: Vec<String>,
}

/// Immutable number -> factor pairs table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: HashMap<u32, Vec<FactorPair>>,
}

impl Catalog {
    /// Parse the JSON reference dataset.
    ///
    /// Pairs are normalised smaller-first; a pair listed twice (in either
    /// orientation) keeps its first position.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<(u32, Vec<String>)> = match serde_json::from_str(json)? {
            CatalogDocument::Entries(entries) => {
                entries.into_iter().map(|e| (e.number, e.factors)).collect()
            }
            CatalogDocument::Map(map) => map
                .into_iter()
                .map(|(key, factors)| {
                    key.trim()
                        .parse::<u32>()
                        .map(|n| (n, factors))
                        .map_err(|_| CatalogError::Parse(format!("bad catalog key {key:?}")))
                })
                .collect::<Result<_, _>>()?,
        };

        let mut entries = HashMap::with_capacity(raw.len());
        for (number, factors) in raw {
            let mut seen = HashSet::new();
            let mut pairs = Vec::with_capacity(factors.len());
            for text in &factors {
                let pair: FactorPair = text.parse()?;
                if seen.insert(pair) {
                    pairs.push(pair);
                }
            }
            entries.insert(number, pairs);
        }
        Ok(Self { entries })
    }

    /// Full catalog for `1..=max`, pairs ordered by ascending smaller factor.
    pub fn enumerate(max: u32) -> Self {
        let entries = (1..=max)
            .map(|n| {
                let pairs = (1..)
                    .take_while(|a| u64::from(*a) * u64::from(*a) <= u64::from(n))
                    .filter(|a| n % a == 0)
                    .map(|a| FactorPair::new(a, n / a))
                    .collect();
                (n, pairs)
            })
            .collect();
        Self { entries }
    }

    pub fn pairs(&self, number: u32) -> Option<&[FactorPair]> {
        self.entries.get(&number).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First catalog pair for `number` not in `observed`.
    pub fn next_pair(&self, number: u32, observed: &HashSet<FactorPair>) -> SolveResult<NextAction> {
        let pairs = self.pairs(number).ok_or(SolveError::UnknownNumber(number))?;
        Ok(pairs
            .iter()
            .find(|pair| !observed.contains(*pair))
            .map_or(NextAction::Complete, |pair| {
                NextAction::TypePair(pair.small(), pair.large())
            }))
    }
}

/// Where the reference dataset comes from.
#[async_trait(?Send)]
pub trait CatalogSource {
    async fn fetch(&self) -> Result<String, CatalogError>;
}

/// Dataset held in memory, e.g. compiled in with `include_str!`.
pub struct StaticSource(pub String);

#[async_trait(?Send)]
impl CatalogSource for StaticSource {
    async fn fetch(&self) -> Result<String, CatalogError> {
        Ok(self.0.clone())
    }
}

/// Lazily loaded, process-wide catalog.
///
/// Loads at most once; callers arriving during a load wait for it. A failed
/// load leaves the cell empty so a later cycle retries.
pub struct CatalogCache {
    source: Box<dyn CatalogSource>,
    cell: OnceCell<Catalog>,
}

impl CatalogCache {
    pub fn new(source: Box<dyn CatalogSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Cache that is already populated.
    pub fn preloaded(catalog: Catalog) -> Self {
        Self {
            source: Box::new(StaticSource(String::new())),
            cell: OnceCell::new_with(Some(catalog)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Load (or reuse) the catalog.
    pub async fn load(&self) -> Result<&Catalog, CatalogError> {
        self.cell
            .get_or_try_init(|| async {
                let json = self.source.fetch().await?;
                let catalog = Catalog::from_json(&json)?;
                debug!(entries = catalog.len(), "factor catalog loaded");
                Ok::<_, CatalogError>(catalog)
            })
            .await
    }

    /// Like [`CatalogCache::load`], logging and discarding the failure.
    pub async fn get(&self) -> Option<&Catalog> {
        match self.load().await {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                error!(error = %e, "factor catalog unavailable");
                None
            }
        }
    }
}
