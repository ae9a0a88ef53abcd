//! Bridge membership: join, leave and reset a channel.
//!
//! Every operation reads the channel's current membership, decides, then
//! writes the whole bridge document back. Nothing serialises those steps, so
//! two callers racing on the same bridge can overwrite each other's upsert.
//! The store's per-document atomicity is the only guarantee.

use std::sync::Arc;

use {
    bridgekeeper_config::BridgesConfig,
    tracing::{debug, error, info},
};

#[cfg(feature = "metrics")]
use bridgekeeper_metrics::{
    adapters as adapter_metrics, bridges as bridge_metrics, counter, histogram, labels,
};

use crate::{
    error::{Error, ErrorCategory, ErrorContext, ErrorKind, Result},
    registry::AdapterRegistry,
    store::BridgeStore,
    types::{BridgeRecord, ChannelState, PlatformMembership},
};

/// Service-level settings.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Prefix turning a bridge name into its id.
    pub id_prefix: String,
    /// Command named in user-facing error messages.
    pub help_command: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self::from(&BridgesConfig::default())
    }
}

impl From<&BridgesConfig> for BridgeSettings {
    fn from(cfg: &BridgesConfig) -> Self {
        Self {
            id_prefix: cfg.id_prefix.clone(),
            help_command: cfg.help_command.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Join,
    Leave,
    Reset,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Reset => "reset",
        }
    }

    #[cfg(feature = "metrics")]
    fn success_metric(self) -> &'static str {
        match self {
            Self::Join => bridge_metrics::JOINS_TOTAL,
            Self::Leave => bridge_metrics::LEAVES_TOTAL,
            Self::Reset => bridge_metrics::RESETS_TOTAL,
        }
    }
}

/// Orchestrates membership changes against a store and the adapter registry.
pub struct BridgeService {
    store: Arc<dyn BridgeStore>,
    adapters: Arc<AdapterRegistry>,
    settings: BridgeSettings,
}

impl BridgeService {
    pub fn new(
        store: Arc<dyn BridgeStore>,
        adapters: Arc<AdapterRegistry>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            store,
            adapters,
            settings,
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Id of the bridge called `name`.
    pub fn bridge_id(&self, name: &str) -> String {
        format!("{}{name}", self.settings.id_prefix)
    }

    /// The bridge `channel` belongs to, if any.
    pub async fn bridge_for_channel(&self, channel: &str) -> Result<Option<BridgeRecord>> {
        self.lookup_channel(&ErrorContext::new(channel, None, None))
            .await
    }

    pub async fn state(&self, channel: &str) -> Result<ChannelState> {
        Ok(match self.bridge_for_channel(channel).await? {
            Some(bridge) => ChannelState::Bridged {
                bridge_id: bridge.id,
            },
            None => ChannelState::Unbridged,
        })
    }

    /// Add `channel` to the bridge called `name`, creating the bridge if needed.
    ///
    /// Returns the bridge as stored. On any failure the store is unchanged.
    pub async fn join(
        &self,
        channel: &str,
        platform: &str,
        name: Option<&str>,
    ) -> Result<BridgeRecord> {
        let result = self.join_inner(channel, platform, name).await;
        self.observe(Operation::Join, result)
    }

    /// Remove `channel` from its bridge. The bridge itself is kept, even if empty.
    pub async fn leave(&self, channel: &str, platform: &str) -> Result<BridgeRecord> {
        let result = self.leave_inner(channel, platform).await;
        self.observe(Operation::Leave, result)
    }

    /// Leave the current bridge (if any), then join again.
    ///
    /// Without `name`, rejoins the bridge the channel was in. If the join
    /// fails after a successful leave, the channel stays unbridged.
    pub async fn reset(
        &self,
        channel: &str,
        platform: &str,
        name: Option<&str>,
    ) -> Result<BridgeRecord> {
        let result = self.reset_inner(channel, platform, name).await;
        self.observe(Operation::Reset, result)
    }

    async fn join_inner(
        &self,
        channel: &str,
        platform: &str,
        name: Option<&str>,
    ) -> Result<BridgeRecord> {
        let ctx = ErrorContext::new(channel, Some(platform), name);

        if self.lookup_channel(&ctx).await?.is_some() {
            return Err(Error::new(ErrorKind::AlreadyInBridge, ctx));
        }

        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Err(Error::new(ErrorKind::MissingName, ctx));
        };

        let Some(adapter) = self.adapters.get(platform) else {
            return Err(Error::new(ErrorKind::NoPlugin, ctx));
        };

        let id = self.bridge_id(name);
        let mut bridge = match self.store.find_by_id(&id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => BridgeRecord::new(&self.settings.id_prefix, name),
            Err(e) => return Err(Error::with_source(ErrorKind::LookupFailed, ctx, e)),
        };

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();
        let senddata = adapter.create_senddata(channel).await;
        #[cfg(feature = "metrics")]
        histogram!(
            adapter_metrics::SENDDATA_DURATION_SECONDS,
            labels::PLATFORM => platform.to_owned()
        )
        .record(started.elapsed().as_secs_f64());
        let senddata =
            senddata.map_err(|e| Error::with_source(ErrorKind::CreateFailed, ctx.clone(), e))?;

        // `bridge` is a local copy; if the upsert fails it is dropped unseen.
        bridge.platforms.push(PlatformMembership {
            channel: channel.to_owned(),
            plugin: platform.to_owned(),
            senddata,
        });
        self.store
            .upsert(&bridge)
            .await
            .map_err(|e| Error::with_source(ErrorKind::PersistFailed, ctx, e))?;

        Ok(bridge)
    }

    async fn leave_inner(&self, channel: &str, platform: &str) -> Result<BridgeRecord> {
        let ctx = ErrorContext::new(channel, Some(platform), None);

        let Some(mut bridge) = self.lookup_channel(&ctx).await? else {
            return Err(Error::new(ErrorKind::NotInBridge, ctx));
        };

        bridge.platforms.retain(|m| m.channel != channel);
        self.store
            .upsert(&bridge)
            .await
            .map_err(|e| Error::with_source(ErrorKind::PersistFailed, ctx, e))?;

        Ok(bridge)
    }

    async fn reset_inner(
        &self,
        channel: &str,
        platform: &str,
        name: Option<&str>,
    ) -> Result<BridgeRecord> {
        let ctx = ErrorContext::new(channel, Some(platform), name);

        let previous = self
            .lookup_channel(&ctx)
            .await?
            .map(|bridge| bridge.derived_name(&self.settings.id_prefix).to_owned());

        if previous.is_some() {
            self.leave_inner(channel, platform).await?;
        }

        let name = name
            .filter(|n| !n.trim().is_empty())
            .or(previous.as_deref());
        self.join_inner(channel, platform, name).await
    }

    async fn lookup_channel(&self, ctx: &ErrorContext) -> Result<Option<BridgeRecord>> {
        self.store
            .find_by_channel(&ctx.channel)
            .await
            .map_err(|e| Error::with_source(ErrorKind::LookupFailed, ctx.clone(), e))
    }

    /// Log and count the outcome of a public operation.
    fn observe(&self, op: Operation, result: Result<BridgeRecord>) -> Result<BridgeRecord> {
        match &result {
            Ok(bridge) => {
                #[cfg(feature = "metrics")]
                counter!(op.success_metric()).increment(1);
                info!(
                    op = op.as_str(),
                    bridge = %bridge.id,
                    members = bridge.platforms.len(),
                    "bridge membership updated"
                );
            },
            Err(e) => {
                let ctx = e.context();
                let platform = ctx.platform.as_deref().unwrap_or_default();
                let name = ctx.name.as_deref().unwrap_or_default();
                match e.category() {
                    ErrorCategory::UserInput => {
                        debug!(
                            op = op.as_str(),
                            kind = e.kind().as_str(),
                            channel = %ctx.channel,
                            "bridge command rejected"
                        );
                    },
                    ErrorCategory::Configuration => {
                        error!(
                            op = op.as_str(),
                            kind = e.kind().as_str(),
                            channel = %ctx.channel,
                            platform,
                            name,
                            "no adapter registered for platform"
                        );
                    },
                    ErrorCategory::Collaborator => {
                        let cause = e.cause().map(ToString::to_string).unwrap_or_default();
                        error!(
                            op = op.as_str(),
                            kind = e.kind().as_str(),
                            channel = %ctx.channel,
                            platform,
                            name,
                            error = %cause,
                            "bridge operation failed"
                        );
                    },
                }
                #[cfg(feature = "metrics")]
                counter!(
                    bridge_metrics::MEMBERSHIP_ERRORS_TOTAL,
                    labels::KIND => e.kind().as_str()
                )
                .increment(1);
            },
        }
        result
    }
}
