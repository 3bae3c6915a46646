use std::mem;

use swagroute_core::ApiRouter;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::SwagrouteError;
use crate::logging::init_tracing;
use crate::settings::Settings;

/// Entrypoint for running a swagroute server
#[non_exhaustive]
pub struct Swagroute;

impl Swagroute {
    /// Installs the tracing subscriber and returns a builder to add routes to
    #[allow(clippy::new_ret_no_self)]
    pub fn new(settings: Settings) -> Result<RouterBuilder, SwagrouteError> {
        init_tracing(&settings)?;
        Ok(RouterBuilder {
            settings,
            routes: ApiRouter::new(),
        })
    }
}

/// Collects the application's routers
pub struct RouterBuilder {
    settings: Settings,
    routes: ApiRouter,
}

impl RouterBuilder {
    /// Adds a router to the builder
    pub fn add_routes(&mut self, router: ApiRouter) -> &mut Self {
        let this = mem::take(&mut self.routes);
        self.routes = this.merge(router);
        self
    }

    /// Starts the webserver
    pub async fn start(&mut self) -> Result<(), SwagrouteError> {
        let (router, routes) = mem::take(&mut self.routes).finish();
        info!(routes = routes.len(), "Finished routing table");

        let socket_addr = self.settings.listen_address;
        let socket = TcpListener::bind(socket_addr).await?;

        info!("Starting to serve webserver on http://{socket_addr}");
        axum::serve(socket, router).await?;

        Ok(())
    }
}
