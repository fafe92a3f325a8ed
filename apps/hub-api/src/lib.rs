pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod store;

use std::sync::Arc;

use config::Config;
use gamerhub_common::SnowflakeGenerator;
use gateway::fanout::GatewayBroadcast;
use gateway::registry::ConnectionRegistry;
use store::communities::CommunityStore;
use store::messages::MessageStore;
use store::users::UserStore;

/// Shared application state available to all route handlers and gateway tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub communities: Arc<CommunityStore>,
    pub messages: Arc<MessageStore>,
    pub users: Arc<UserStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub broadcast: Arc<GatewayBroadcast>,
    pub snowflake: Arc<SnowflakeGenerator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let communities = CommunityStore::new();
        match &config.genres {
            Some(slugs) => {
                for slug in slugs {
                    communities.ensure(slug);
                }
            }
            None => communities.seed(store::communities::DEFAULT_GENRES),
        }

        Self {
            snowflake: Arc::new(SnowflakeGenerator::new(config.worker_id)),
            config: Arc::new(config),
            communities: Arc::new(communities),
            messages: Arc::new(MessageStore::new()),
            users: Arc::new(UserStore::new()),
            registry: Arc::new(ConnectionRegistry::new()),
            broadcast: Arc::new(GatewayBroadcast::new()),
        }
    }
}
