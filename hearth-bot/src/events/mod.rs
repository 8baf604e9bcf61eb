use poise::serenity_prelude as serenity;

use hearth_core::{Data, Error};

/// Forward gateway events to the dispatcher. Errors returned here reach
/// the framework's `on_error` and are escalated under the event's name.
pub async fn route(event: &serenity::FullEvent, data: &Data) -> Result<(), Error> {
    let dispatcher = &data.dispatcher;

    match event {
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            dispatcher
                .on_member_join(new_member.guild_id, new_member.user.id)
                .await;
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            dispatcher.on_ready(&data_about_bot.user.tag());
        }
        serenity::FullEvent::ShardStageUpdate { event }
            if matches!(event.new, serenity::ConnectionStage::Disconnected) =>
        {
            dispatcher.on_disconnect();
        }
        serenity::FullEvent::Resume { .. } => {
            dispatcher.on_resume();
        }
        _ => {}
    }

    Ok(())
}
