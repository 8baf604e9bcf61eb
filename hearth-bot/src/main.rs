mod events;
mod signals;

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use hearth_core::lifecycle::SHUTDOWN_GRACE;
use hearth_core::{Config, Data, Error, Lifecycle, SerenityTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();

    // Missing token ends the process here, before any connection attempt.
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!(error = %format!("{err:#}"), "invalid configuration; refusing to start");
            return Err(err);
        }
    };
    info!(?config, "configuration loaded");

    if config.role_id.is_none() || config.welcome_channel_id.is_none() {
        warn!("DISCORD_ROLE_ID or DISCORD_WELCOME_CHANNEL_ID missing; welcome messages disabled.");
    }
    if config.operator_ids.is_empty() {
        warn!("ERROR_REPORT_USER_IDS is empty; errors will only be logged.");
    }

    let lifecycle = Lifecycle::new();

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MEMBERS;

    let setup_config = config.clone();
    let setup_lifecycle = lifecycle.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: hearth_commands::commands(),
            event_handler: |_ctx, event, _framework, data| Box::pin(events::route(event, data)),
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(hearth_commands::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let config = setup_config.clone();
            let lifecycle = setup_lifecycle.clone();
            Box::pin(async move {
                info!(user = %ready.user.tag(), "Hearth has awoken!");

                match config.guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await?;
                        info!(%guild_id, "commands registered in guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("commands registered globally");
                    }
                }

                let transport = Arc::new(SerenityTransport::from_context(ctx));
                let data = Data::new(config, transport, lifecycle.clone());

                if lifecycle.start_liveness(data.liveness.clone()).await {
                    info!(
                        interval_secs = data.liveness.interval().as_secs(),
                        "liveness reporting scheduled"
                    );
                }

                Ok(data)
            })
        })
        .build();

    info!("Hearth is connecting...");

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    let watcher_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        watcher_lifecycle
            .watch_shutdown(signals::wait_for_shutdown_signal(), move || async move {
                shard_manager.shutdown_all().await;
            })
            .await;
    });

    client.start().await?;

    lifecycle.request_shutdown();
    lifecycle.stop_liveness(SHUTDOWN_GRACE).await;
    info!("Hearth shut down cleanly.");
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, "command error");

            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .ephemeral(true)
                        .content("Something went wrong while running this command."),
                )
                .await;

            ctx.data()
                .dispatcher
                .on_internal_error(&ctx.command().qualified_name, &error)
                .await;
        }
        poise::FrameworkError::EventHandler {
            error,
            event,
            framework,
            ..
        } => {
            framework
                .user_data
                .dispatcher
                .on_internal_error(event.snake_case_name(), &error)
                .await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}
