//! Built-in converters and their registries.
//!
//! | Key | Creator | Role |
//! |-----|---------|------|
//! | `.irm` | [`module::ModuleConverterCreator`] | preprocessor: IR module to IR |
//! | language name | [`ir::IrConverterCreator`] | target: IR to that language |

pub mod ir;
pub mod module;

use crate::converter::{ConverterCreator, CreatorRegistry};
use ir_syntax::Language;
use std::sync::Arc;

/// Preprocessors keyed by source extension.
pub fn default_preprocessors() -> CreatorRegistry {
    let mut registry = CreatorRegistry::new();
    registry.insert(
        module::MODULE_EXTENSION.to_string(),
        Arc::new(module::ModuleConverterCreator) as Arc<dyn ConverterCreator>,
    );
    registry
}

/// One target converter per language, keyed by language name.
pub fn language_targets(languages: &[&'static Language]) -> CreatorRegistry {
    languages
        .iter()
        .map(|&language| {
            (
                language.name.to_string(),
                Arc::new(ir::IrConverterCreator::new(language)) as Arc<dyn ConverterCreator>,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_are_keyed_as_expected() {
        assert!(default_preprocessors().contains_key(".irm"));
        let targets = language_targets(&[
            ir_syntax::by_name("Python").unwrap(),
            ir_syntax::by_name("Ruby").unwrap(),
        ]);
        let mut keys: Vec<_> = targets.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["Python", "Ruby"]);
    }
}
