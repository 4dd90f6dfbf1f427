//! Version-keyed service resolver.
//!
//! A [`ServiceResolver`] is an explicitly constructed registry mapping
//! [`DatabaseInfo`] keys to factories. Keys may pin only the product name, or
//! additionally the version string, major and minor version. Resolving a live
//! description picks the most specific matching registration.
//!
//! ```rust,ignore
//! let mut dialects: ServiceResolver<dyn Dialect> = ServiceResolver::new("dialect");
//! dialects.register(DatabaseInfo::mssql_server(), |_| Arc::new(MssqlDialect::new()));
//! dialects.register(DatabaseInfo::mssql_server().major_version(10), |_| {
//!     Arc::new(MssqlDialect::legacy())
//! });
//! let dialect = dialects.resolve(session.database_info())?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{MigrateError, Result};

use super::database_info::DatabaseInfo;

/// Factory producing a service for a live database description.
pub type Factory<T> = Arc<dyn Fn(&DatabaseInfo) -> Arc<T> + Send + Sync>;

struct Registration<T: ?Sized> {
    key: DatabaseInfo,
    factory: Factory<T>,
}

/// Registry of service factories keyed by database product and version.
///
/// Resolutions are cached per distinct live [`DatabaseInfo`] for the lifetime
/// of the resolver. The cache sits behind a mutex so one resolver can be shared
/// between sessions.
pub struct ServiceResolver<T: ?Sized> {
    service: String,
    registrations: Vec<Registration<T>>,
    default: Option<Factory<T>>,
    cache: Mutex<HashMap<DatabaseInfo, Arc<T>>>,
}

impl<T: ?Sized> ServiceResolver<T> {
    /// Create an empty resolver. `service` names the kind of service in errors.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            registrations: Vec::new(),
            default: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Register a factory under a key. Later registrations of equally specific
    /// keys take precedence.
    pub fn register<F>(&mut self, key: DatabaseInfo, factory: F)
    where
        F: Fn(&DatabaseInfo) -> Arc<T> + Send + Sync + 'static,
    {
        self.registrations.push(Registration {
            key,
            factory: Arc::new(factory),
        });
        self.clear_cache();
    }

    /// Register a shared instance under a key.
    pub fn register_instance(&mut self, key: DatabaseInfo, instance: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.register(key, move |_| Arc::clone(&instance));
    }

    /// Factory used when no registration matches.
    pub fn set_default<F>(&mut self, factory: F)
    where
        F: Fn(&DatabaseInfo) -> Arc<T> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(factory));
        self.clear_cache();
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &DatabaseInfo> {
        self.registrations.iter().map(|r| &r.key)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Resolve the most specific service for a live database.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::NoService` when nothing matches and no default is
    /// set.
    pub fn resolve(&self, info: &DatabaseInfo) -> Result<Arc<T>> {
        self.try_resolve(info)
            .ok_or_else(|| MigrateError::no_service(self.service.clone(), info))
    }

    /// Resolve without treating a miss as an error.
    pub fn try_resolve(&self, info: &DatabaseInfo) -> Option<Arc<T>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(service) = cache.get(info) {
            return Some(Arc::clone(service));
        }

        let factory = match self.best_match(info) {
            Some(registration) => {
                debug!(
                    "Resolved {} for {} using key {}",
                    self.service, info, registration.key
                );
                Arc::clone(&registration.factory)
            }
            None => {
                let factory = self.default.as_ref()?;
                debug!("Resolved default {} for {}", self.service, info);
                Arc::clone(factory)
            }
        };

        let service = factory(info);
        cache.insert(info.clone(), Arc::clone(&service));
        Some(service)
    }

    /// Whether a registration (not the default) matches the live database.
    pub fn has_match(&self, info: &DatabaseInfo) -> bool {
        self.best_match(info).is_some()
    }

    fn best_match(&self, info: &DatabaseInfo) -> Option<&Registration<T>> {
        self.registrations
            .iter()
            .enumerate()
            .filter(|(_, r)| r.key.matches(info))
            .max_by_key(|(order, r)| {
                (
                    r.key.specificity(),
                    r.key.product_version.is_some(),
                    r.key.major_version.is_some(),
                    r.key.minor_version.is_some(),
                    *order,
                )
            })
            .map(|(_, r)| r)
    }

    fn clear_cache(&mut self) {
        self.cache
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl<T: ?Sized> fmt::Debug for ServiceResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceResolver")
            .field("service", &self.service)
            .field(
                "keys",
                &self.keys().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver() -> ServiceResolver<str> {
        let mut resolver: ServiceResolver<str> = ServiceResolver::new("label");
        resolver.register(DatabaseInfo::new("X"), |_| Arc::from("first"));
        resolver.register(DatabaseInfo::new("X").product_version("9.0"), |_| {
            Arc::from("second")
        });
        resolver.register(DatabaseInfo::with_version("X", "9.0", 9, 2), |_| {
            Arc::from("third")
        });
        resolver
    }

    #[test]
    fn test_most_specific_registration_wins() {
        let resolver = resolver();
        let exact = resolver
            .resolve(&DatabaseInfo::with_version("X", "9.0", 9, 2))
            .unwrap();
        assert_eq!(&*exact, "third");

        let minor_differs = resolver
            .resolve(&DatabaseInfo::with_version("X", "9.0", 9, 5))
            .unwrap();
        assert_eq!(&*minor_differs, "second");

        let older = resolver
            .resolve(&DatabaseInfo::with_version("X", "8.0", 8, 0))
            .unwrap();
        assert_eq!(&*older, "first");
    }

    #[test]
    fn test_product_name_is_case_insensitive() {
        let resolver = resolver();
        let found = resolver.resolve(&DatabaseInfo::new("x")).unwrap();
        assert_eq!(&*found, "first");
    }

    #[test]
    fn test_later_registration_wins_ties() {
        let mut resolver: ServiceResolver<str> = ServiceResolver::new("label");
        resolver.register(DatabaseInfo::new("Y"), |_| Arc::from("old"));
        resolver.register(DatabaseInfo::new("Y"), |_| Arc::from("new"));
        assert_eq!(&*resolver.resolve(&DatabaseInfo::new("Y")).unwrap(), "new");
    }

    #[test]
    fn test_default_and_no_service() {
        let mut resolver: ServiceResolver<str> = ServiceResolver::new("dialect");
        let err = resolver.resolve(&DatabaseInfo::new("Z")).unwrap_err();
        assert!(matches!(err, MigrateError::NoService { .. }));
        assert!(err.to_string().contains("dialect"));

        resolver.set_default(|_| Arc::from("generic"));
        assert_eq!(&*resolver.resolve(&DatabaseInfo::new("Z")).unwrap(), "generic");
        assert!(!resolver.has_match(&DatabaseInfo::new("Z")));
    }

    #[test]
    fn test_resolution_is_cached_per_database_info() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut resolver: ServiceResolver<str> = ServiceResolver::new("label");
        resolver.register(DatabaseInfo::new("X"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::from("made")
        });

        let info = DatabaseInfo::with_version("X", "1.0", 1, 0);
        let a = resolver.resolve(&info).unwrap();
        let b = resolver.resolve(&info).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        resolver
            .resolve(&DatabaseInfo::with_version("X", "2.0", 2, 0))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
