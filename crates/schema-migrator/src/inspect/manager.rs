//! Inspection orchestration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::context::{InspectionContext, InspectionResults};
use super::scope::InspectionScope;
use super::{Inspector, MetaDataType};
use crate::core::resolver::ServiceResolver;
use crate::core::schema::Database;
use crate::core::session::Session;
use crate::core::DatabaseInfo;
use crate::dialect::Dialect;
use crate::error::{MigrateError, Result};

/// Version-keyed inspectors for one object type.
pub type InspectorResolver = ServiceResolver<dyn Inspector>;

/// Runs inspectors in object-type order against a session.
pub struct InspectionManager {
    dialects: ServiceResolver<dyn Dialect>,
    inspectors: BTreeMap<MetaDataType, InspectorResolver>,
}

impl InspectionManager {
    /// Empty manager resolving dialects with `dialects`.
    pub fn new(dialects: ServiceResolver<dyn Dialect>) -> Self {
        Self {
            dialects,
            inspectors: BTreeMap::new(),
        }
    }

    /// Manager with every built-in dialect and inspector registered.
    pub fn with_builtins() -> Self {
        let mut manager = Self::new(crate::drivers::dialect_resolver());
        crate::drivers::register_inspectors(&mut manager);
        manager
    }

    pub fn dialects(&self) -> &ServiceResolver<dyn Dialect> {
        &self.dialects
    }

    /// Resolver for one object type, created on first use.
    pub fn inspector_resolver(&mut self, object_type: MetaDataType) -> &mut InspectorResolver {
        self.inspectors
            .entry(object_type)
            .or_insert_with(|| ServiceResolver::new(format!("{} inspector", object_type)))
    }

    /// Register a vendor inspector under `key`.
    pub fn register<I>(&mut self, key: DatabaseInfo, inspector: I)
    where
        I: Inspector + 'static,
    {
        let object_type = inspector.object_type();
        let inspector: Arc<dyn Inspector> = Arc::new(inspector);
        self.inspector_resolver(object_type)
            .register_instance(key, inspector);
    }

    /// Register the inspector used when no vendor one matches.
    pub fn register_generic<I>(&mut self, inspector: I)
    where
        I: Inspector + 'static,
    {
        let object_type = inspector.object_type();
        let inspector: Arc<dyn Inspector> = Arc::new(inspector);
        self.inspector_resolver(object_type)
            .set_default(move |_| Arc::clone(&inspector));
    }

    /// Inspector for `object_type` on the given database.
    ///
    /// # Errors
    ///
    /// `MigrateError::NoService` when neither a vendor nor a generic
    /// inspector is registered.
    pub fn resolve_inspector(&self, object_type: MetaDataType, info: &DatabaseInfo) -> Result<Arc<dyn Inspector>> {
        match self.inspectors.get(&object_type) {
            Some(resolver) => resolver.resolve(info),
            None => Err(MigrateError::no_service(
                format!("{} inspector", object_type),
                info,
            )),
        }
    }

    /// Object types that can be inspected on the given database.
    pub fn supported_types(&self, info: &DatabaseInfo) -> Vec<MetaDataType> {
        self.inspectors
            .iter()
            .filter(|(_, resolver)| resolver.has_default() || resolver.has_match(info))
            .map(|(object_type, _)| *object_type)
            .collect()
    }

    /// Inspect `types` within `scope` into a fresh graph.
    pub async fn inspect(
        &self,
        session: &mut dyn Session,
        scope: &InspectionScope,
        types: &[MetaDataType],
    ) -> Result<InspectionResults> {
        let info = session.database_info().clone();
        let dialect = self.dialects.resolve(&info)?;
        let database = Database::new(info, session.driver_info().clone(), dialect.name());
        self.inspect_into(session, InspectionResults::new(database), scope, types)
            .await
    }

    /// Inspect every type available for the session's database.
    pub async fn inspect_all(&self, session: &mut dyn Session, scope: &InspectionScope) -> Result<InspectionResults> {
        let types = self.supported_types(session.database_info());
        self.inspect(session, scope, &types).await
    }

    /// Inspect `types` within `scope`, merging into `results`.
    ///
    /// The session is committed when the pass ends, whether it succeeded or
    /// not; a commit failure after an inspection error is only logged.
    pub async fn inspect_into(
        &self,
        session: &mut dyn Session,
        results: InspectionResults,
        scope: &InspectionScope,
        types: &[MetaDataType],
    ) -> Result<InspectionResults> {
        let started = Instant::now();
        let dialect = self.dialects.resolve(session.database_info())?;

        let mut types = types.to_vec();
        types.sort();
        types.dedup();

        let mut context = InspectionContext::new(session, dialect, results);
        match self.run(&mut context, scope, &types).await {
            Ok(()) => {
                let results = context.release().await?;
                info!(
                    "Inspected {} ({}) in {:?}: {} tables",
                    results.database().info,
                    types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "),
                    started.elapsed(),
                    results.database().tables().count()
                );
                Ok(results)
            }
            Err(e) => {
                if let Err(commit_err) = context.release().await {
                    debug!("Commit after failed inspection also failed: {}", commit_err);
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        context: &mut InspectionContext<'_>,
        scope: &InspectionScope,
        types: &[MetaDataType],
    ) -> Result<()> {
        for object_type in types {
            let inspector = self.resolve_inspector(*object_type, context.database_info())?;
            if inspector.supports(context, scope) {
                debug!("Inspecting {} within {:?} using {:?}", object_type, scope, inspector);
                inspector.inspect_scope(context, scope).await?;
            } else {
                debug!("Inspecting every {} using {:?}", object_type, inspector);
                inspector.inspect(context).await?;
            }
            context.results_mut().mark_inspected(*object_type);
        }
        Ok(())
    }
}

impl fmt::Debug for InspectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectionManager")
            .field("dialects", &self.dialects)
            .field("inspectors", &self.inspectors.keys().collect::<Vec<_>>())
            .finish()
    }
}
