use crc32fast::Hasher;

/// Hash an arbitrary string into a short hex seed
pub fn seed_from(input: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential node ID generator.
///
/// IDs look like `heading-1a2b3c4d-7`: node kind, generator seed, counter.
/// The seed keeps IDs from two generators apart; the counter keeps IDs from
/// one generator apart. Nothing is derived from node content.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    /// Generator seeded from the current time and process
    pub fn new() -> Self {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();
        Self::from_seed(seed_from(&format!("{}:{}", std::process::id(), nanos)))
    }

    /// Generator seeded from a caller-chosen prefix (hashed)
    pub fn with_prefix(prefix: &str) -> Self {
        Self::from_seed(seed_from(prefix))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Next ID for a node of the given kind
    pub fn new_id(&mut self, kind: &str) -> String {
        self.count += 1;
        format!("{}-{}-{}", kind, self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Move the counter past every ID in `ids` that this generator could
    /// have minted, so none of them is handed out again
    pub fn skip_past<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let infix = format!("-{}-", self.seed);
        for id in ids {
            let Some(at) = id.rfind(&infix) else {
                continue;
            };
            if let Ok(count) = id[at + infix.len()..].parse::<u64>() {
                self.count = self.count.max(count);
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
