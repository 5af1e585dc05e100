use tracing::info;

use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn run(args: &ServeArgs) -> Result<(), CliError> {
    info!(
        bind = %args.service.bind,
        model = %args.service.model_path.display(),
        offline = args.service.offline,
        "starting stockcast server"
    );
    stockcast_web::serve(args.service.clone()).await?;
    Ok(())
}
