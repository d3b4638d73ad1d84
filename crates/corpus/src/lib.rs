//! License corpus: metadata for every known license and the rules that
//! recognize them.
//!
//! Records come from a [`CorpusSource`] (in memory or a directory of YAML
//! files) and are validated in one step by [`Corpus::build`]. A corpus that
//! fails any check is never returned partially built. Once built it is
//! read-only and safe to share between threads.
//!
//! ```
//! use canonical::NormalizeConfig;
//! use corpus::{Corpus, InMemoryCorpus, LicenseRecord, RuleRecord};
//!
//! let source = InMemoryCorpus::default()
//!     .with_license(LicenseRecord::new("mit").with_short_name("MIT License"))
//!     .with_rule(RuleRecord::new("mit_1.RULE", "Licensed under the MIT license", ["mit"]));
//! let corpus = Corpus::load(&source, &NormalizeConfig::default()).unwrap();
//! assert_eq!(corpus.rules().len(), 1);
//! ```

mod corpus;
mod error;
mod license;
mod rule;
mod source;

pub use crate::corpus::{Corpus, LICENSE_RULE_SUFFIX};
pub use crate::error::CorpusError;
pub use crate::license::{License, LicenseDb, LicenseRecord};
pub use crate::rule::{Rule, RuleId, RuleRecord, RuleStore};
pub use crate::source::{CorpusData, CorpusSource, DirectoryCorpus, InMemoryCorpus};
