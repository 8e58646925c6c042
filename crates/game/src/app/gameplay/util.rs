fn cursor_world_position(input: &InputSnapshot, world: &SceneWorld) -> Option<Vec2> {
    let cursor_px = input.cursor_position_px()?;
    Some(screen_to_world_px(
        world.camera(),
        world.layout().logical_size,
        input.window_size(),
        cursor_px,
    ))
}

/// Point on the segment `to -> from` that is `distance` away from `to`, or
/// `from` itself when it is already that close.
fn approach_point(from: Vec2, to: Vec2, distance: f32) -> Vec2 {
    let gap = from.distance(to);
    if gap <= distance || gap <= f32::EPSILON {
        return from;
    }
    let t = distance / gap;
    Vec2::new(to.x + (from.x - to.x) * t, to.y + (from.y - to.y) * t)
}

fn describe_target(world: &SceneWorld, target: &ClickTarget) -> String {
    match target {
        ClickTarget::Character(id) => match world.character(*id) {
            Some(character) => format!("character {}", character.name()),
            None => "nothing".to_string(),
        },
        ClickTarget::Exit {
            name, target_scene, ..
        } => format!("exit {name} to {target_scene}"),
        ClickTarget::Ground(point) => format!("ground at ({:.1}, {:.1})", point.x, point.y),
    }
}
