use crate::{
    error::ServiceError,
    services::sse_events::broadcast_session,
    state::{SharedState, session::Session},
};

/// Run a session mutation under the session lock, then broadcast the resulting state.
///
/// Nothing is broadcast when the mutation fails; the session is left unchanged in that case.
pub async fn mutate_with_broadcast<T, E>(
    state: &SharedState,
    work: impl FnOnce(&mut Session) -> Result<T, E>,
) -> Result<T, ServiceError>
where
    E: Into<ServiceError>,
{
    let value = state
        .session()
        .mutate(work)
        .await
        .map_err(Into::<ServiceError>::into)?;
    broadcast_session(state).await;
    Ok(value)
}
