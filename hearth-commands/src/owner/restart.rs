use tracing::info;

use hearth_core::restart::RestartDecision;
use hearth_core::{Context, Error};

/// Restart the bot. The process exits cleanly and its supervisor relaunches it.
#[poise::command(prefix_command, slash_command, category = "Owner")]
pub async fn restart(ctx: Context<'_>) -> Result<(), Error> {
    let decision = ctx
        .data()
        .restart
        .handle(ctx.author().id, |reply| async move {
            ctx.send(
                poise::CreateReply::default()
                    .content(reply.text())
                    .ephemeral(reply.is_ephemeral()),
            )
            .await?;
            Ok::<_, Error>(())
        })
        .await?;

    if decision == RestartDecision::Accepted {
        info!(invoked_by = %ctx.author().id, "restart acknowledged; shutting down");
    }

    Ok(())
}
