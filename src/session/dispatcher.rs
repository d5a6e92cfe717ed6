//! Command dispatcher
//!
//! Executes one parsed client line against the registry and broadcast bus.
//! Validation failures are answered on the caller's own inbox and never
//! change shared state.

use std::sync::Arc;

use super::context::Session;
use crate::error::{Error, Result};
use crate::protocol::message::{
    self, REPLY_NAME_TAKEN, REPLY_SENT, REPLY_USER_NOT_FOUND,
};
use crate::protocol::Command;
use crate::registry::RegistryError;
use crate::server::Hub;

/// Handle a single line received from `session`
pub async fn dispatch(hub: &Hub, session: &Arc<Session>, line: &str) -> Result<()> {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!(session_id = session.id(), error = %e, "Malformed command");
            return session.send(e.reply()).await;
        }
    };

    match command {
        Command::Who => {
            // Listing is built under the registry lock, replies are queued after it
            for entry in hub.registry().snapshot().await {
                session
                    .send(message::online_line(&entry.peer_addr, &entry.name))
                    .await?;
            }
            Ok(())
        }

        Command::Rename(new_name) => match hub.registry().rename(session, new_name).await {
            Ok(()) => session.send(message::renamed_reply(new_name)).await,
            Err(RegistryError::NameTaken(_)) => session.send(REPLY_NAME_TAKEN).await,
            Err(e) => Err(e.into()),
        },

        Command::Private { to, text } => {
            let from = hub
                .registry()
                .name_of(session)
                .await
                .ok_or(RegistryError::NotOnline(session.id()))?;

            match hub
                .registry()
                .send_to(to, message::private_line(&from, text))
                .await
            {
                Ok(()) => {
                    hub.stats().private_message();
                    session.send(REPLY_SENT).await
                }
                Err(Error::Registry(RegistryError::NotFound(_))) => {
                    session.send(REPLY_USER_NOT_FOUND).await
                }
                Err(e) => Err(e),
            }
        }

        Command::Broadcast(text) => hub.broadcast_from(session, text).await,
    }
}
