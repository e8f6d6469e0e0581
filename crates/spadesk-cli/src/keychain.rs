use spadesk_api::{DurableStorage, SpaError};

/// Durable session storage in the OS credential store. Each storage key is a
/// separate entry under one service name.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, SpaError> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| SpaError::Storage(format!("Keychain error: {e}")))
    }
}

impl DurableStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SpaError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SpaError::Storage(format!("Failed to read '{key}': {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SpaError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SpaError::Storage(format!("Failed to store '{key}' in keychain: {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), SpaError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SpaError::Storage(format!("Failed to delete '{key}': {e}"))),
        }
    }
}
