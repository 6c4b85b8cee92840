// src/grid/systems/forward.rs
use bevy::prelude::*;
use std::any;

/// Carries an event produced on a background task back into the ECS.
#[derive(Component)]
pub struct SendEvent<E: Event> {
    pub event: E,
}

pub fn forward_events<E: Event + Clone + std::fmt::Debug>(
    mut commands: Commands,
    mut writer: EventWriter<E>,
    query: Query<(Entity, &SendEvent<E>)>,
    mut event_type_name: Local<String>,
) {
    if event_type_name.is_empty() {
        *event_type_name = any::type_name::<E>()
            .split("::")
            .last()
            .unwrap_or("UnknownEvent")
            .to_string();
    }

    let mut count = 0;
    for (entity, send_event) in query.iter() {
        count += 1;
        trace!("Forwarding '{}' #{}: {:?}", *event_type_name, count, send_event.event);
        writer.write(send_event.event.clone());
        commands.entity(entity).despawn();
    }

    if count > 0 {
        debug!("Forwarded {} '{}' event(s).", count, *event_type_name);
    }
}
