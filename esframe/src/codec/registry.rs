use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use log::{debug, info};

use crate::codec::g711::G711Ops;
use crate::codec::pcm::PcmOps;
use crate::codec::{CodecOps, CodecType};
use crate::utils::errors::DecodeError;

/// Maps codec types to their operation tables.
///
/// Lookups take a read lock, registration a write lock, so registering from
/// one thread while another opens decoders is safe. Entries are reference
/// counted: a decoder opened from an entry keeps its engine alive even if
/// the entry is unregistered afterwards.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<CodecType, Arc<dyn CodecOps>>>,
}

impl CodecRegistry {
    /// Registers `ops` under [`CodecOps::codec_type`].
    ///
    /// Fails with [`DecodeError::AlreadyRegistered`] if the type is taken;
    /// the existing entry is left untouched.
    pub fn register(&self, ops: Arc<dyn CodecOps>) -> Result<(), DecodeError> {
        let codec = ops.codec_type();
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        if codecs.contains_key(&codec) {
            return Err(DecodeError::AlreadyRegistered(codec));
        }
        codecs.insert(codec, ops);
        info!("Registered codec {codec}");
        Ok(())
    }

    pub fn get(&self, codec: CodecType) -> Option<Arc<dyn CodecOps>> {
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&codec)
            .cloned()
    }

    pub fn is_registered(&self, codec: CodecType) -> bool {
        self.get(codec).is_some()
    }

    pub fn unregister(&self, codec: CodecType) -> Result<(), DecodeError> {
        self.codecs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&codec)
            .map(|_| debug!("Unregistered codec {codec}"))
            .ok_or(DecodeError::NotFound(codec))
    }

    pub fn unregister_all(&self) {
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Unregistering {} codecs", codecs.len());
        codecs.clear();
    }

    /// Copy of the current table. Later registrations do not show up in it.
    pub fn snapshot(&self) -> HashMap<CodecType, Arc<dyn CodecOps>> {
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registered types ordered by id.
    pub fn registered_types(&self) -> Vec<CodecType> {
        let mut types = self
            .codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect::<Vec<_>>();
        types.sort_by_key(|codec| codec.id());
        types
    }
}

/// The process-wide registry.
pub fn registry() -> &'static CodecRegistry {
    static REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    REGISTRY.get_or_init(CodecRegistry::default)
}

/// Registers the engines shipped with this crate, skipping types that are
/// already present.
pub fn register_default_codecs(registry: &CodecRegistry) {
    let defaults: [Arc<dyn CodecOps>; 3] = [
        Arc::new(PcmOps),
        Arc::new(G711Ops::alaw()),
        Arc::new(G711Ops::ulaw()),
    ];
    for ops in defaults {
        if let Err(e) = registry.register(ops) {
            debug!("Keeping existing entry: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecConfig, CodecHandle};

    struct Dummy(CodecType);

    impl CodecOps for Dummy {
        fn codec_type(&self) -> CodecType {
            self.0
        }

        fn open(&self, _cfg: &CodecConfig) -> Result<Box<dyn CodecHandle>, DecodeError> {
            Err(DecodeError::NotSupport)
        }
    }

    #[test]
    fn register_get_unregister() {
        let registry = CodecRegistry::default();
        assert!(registry.get(CodecType::Opus).is_none());

        registry.register(Arc::new(Dummy(CodecType::Opus))).unwrap();
        assert!(registry.is_registered(CodecType::Opus));

        assert_eq!(
            registry
                .register(Arc::new(Dummy(CodecType::Opus)))
                .unwrap_err(),
            DecodeError::AlreadyRegistered(CodecType::Opus)
        );

        registry.unregister(CodecType::Opus).unwrap();
        assert_eq!(
            registry.unregister(CodecType::Opus).unwrap_err(),
            DecodeError::NotFound(CodecType::Opus)
        );
    }

    #[test]
    fn defaults_and_unregister_all() {
        let registry = CodecRegistry::default();
        registry.register(Arc::new(Dummy(CodecType::Custom(7)))).unwrap();
        register_default_codecs(&registry);
        register_default_codecs(&registry);

        assert_eq!(
            registry.registered_types(),
            vec![
                CodecType::Pcm,
                CodecType::G711A,
                CodecType::G711U,
                CodecType::Custom(7)
            ]
        );

        registry.unregister_all();
        assert!(registry.registered_types().is_empty());
    }

    #[test]
    fn concurrent_lookup_during_registration() {
        let registry = Arc::new(CodecRegistry::default());
        let writers = (0..4u16)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for j in 0..32u16 {
                        let _ = registry.register(Arc::new(Dummy(CodecType::Custom(i * 32 + j))));
                    }
                })
            })
            .collect::<Vec<_>>();
        for _ in 0..128 {
            let _ = registry.get(CodecType::Custom(3));
        }
        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(registry.registered_types().len(), 128);
    }
}
