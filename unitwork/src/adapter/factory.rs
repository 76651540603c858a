// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Adapter factory
//!
//! Builds one of the bundled adapters from an [`AdapterConfig`] and hands it
//! out as a shared trait object, ready to be wrapped in a unit of work or a
//! repository.

use super::memory::MemoryAdapter;
use super::types::{AdapterConfig, AdapterType};
use super::StagedAdapter;
use crate::error::UowResult;
use std::sync::Arc;

/// Factory function to create an adapter based on configuration
///
/// # Examples
/// ```ignore
/// use unitwork::adapter::{create_adapter, AdapterConfig};
///
/// let adapter = create_adapter(&AdapterConfig::memory())?;
/// let mut uow = unitwork::UnitOfWork::new(adapter);
/// ```
pub fn create_adapter(config: &AdapterConfig) -> UowResult<Arc<dyn StagedAdapter>> {
    config.validate()?;

    match config.adapter_type {
        AdapterType::Memory => Ok(Arc::new(MemoryAdapter::new()) as Arc<dyn StagedAdapter>),
        #[cfg(feature = "sled-backend")]
        AdapterType::Sled => {
            use super::sled::SledAdapter;
            let adapter = SledAdapter::open(config.sled.clone())?;
            Ok(Arc::new(adapter) as Arc<dyn StagedAdapter>)
        }
        #[cfg(not(feature = "sled-backend"))]
        AdapterType::Sled => Err(crate::error::UowError::config(
            "sled adapter requires the 'sled-backend' feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SledAdapterConfig;
    use crate::entity::EntityStore;
    use crate::error::UowError;

    #[test]
    fn test_create_memory_adapter() {
        let adapter = create_adapter(&AdapterConfig::memory()).unwrap();
        assert_eq!(adapter.count("anything").unwrap(), 0);
    }

    #[cfg(feature = "sled-backend")]
    #[test]
    fn test_create_sled_adapter() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = AdapterConfig::sled(SledAdapterConfig::at(temp_dir.path()));
        let adapter = create_adapter(&config).unwrap();
        assert_eq!(adapter.count("anything").unwrap(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AdapterConfig {
            adapter_type: AdapterType::Sled,
            sled: SledAdapterConfig::default(),
        };
        assert!(matches!(create_adapter(&config), Err(UowError::Config(_))));
    }
}
