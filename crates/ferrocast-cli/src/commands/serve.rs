use std::net::SocketAddr;
use std::sync::Arc;

use ferrocast_core::{ArimaEstimator, PriceSource};
use ferrocast_web::AppState;

use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, source: Arc<dyn PriceSource>) -> Result<(), CliError> {
    let addr: SocketAddr = args.bind.parse().map_err(|_| CliError::InvalidBind {
        value: args.bind.clone(),
    })?;
    let state = AppState::new(source, Arc::new(ArimaEstimator));
    ferrocast_web::serve(addr, state).await?;
    Ok(())
}
