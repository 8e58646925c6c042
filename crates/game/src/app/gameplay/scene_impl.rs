impl Scene for AdventureScene {
    fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneError> {
        world
            .configure(
                self.def.layout(),
                self.def.walkable_area.clone(),
                self.def.navigation_settings(self.solver),
            )
            .map_err(|source| SceneError::Navigation {
                scene: self.def.name.clone(),
                source,
            })?;

        self.player_id = None;
        self.pending_action = None;
        for character in &self.def.characters {
            let kind = if character.player {
                CharacterKind::Player
            } else {
                CharacterKind::Npc
            };
            let id = world.spawn_character(CharacterSpawn {
                name: character.name.clone(),
                kind,
                position: character.position,
                walk_speed: character.walk_speed,
            });
            if character.player {
                self.player_id = Some(id);
            }
        }
        world.apply_pending();

        if let Some(position) = self.player_position(world) {
            world.center_camera_on(position);
        }
        info!(
            scene = %self.def.name,
            character_count = world.character_count(),
            exit_count = self.def.exits.len(),
            has_player = self.player_id.is_some(),
            "scene_ready"
        );
        Ok(())
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.right_click_pressed() {
            if let Some(point) = cursor_world_position(input, world) {
                let target = self.resolve_click_target(world, point);
                info!(
                    scene = %self.def.name,
                    target = %describe_target(world, &target),
                    "look_at"
                );
            }
        }

        if input.left_click_pressed() {
            if let Some(point) = cursor_world_position(input, world) {
                let command = self.handle_click(world, point);
                if !matches!(command, SceneCommand::None) {
                    return command;
                }
            }
        }

        let arrived = world.advance_characters(fixed_dt_seconds);
        let Some(player_id) = self.player_id else {
            return SceneCommand::None;
        };
        if let Some(position) = self.player_position(world) {
            world.center_camera_on(position);
        }
        if arrived.contains(&player_id) {
            if let Some(action) = self.pending_action.take() {
                return self.complete_action(world, action);
            }
        }
        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        debug!(scene = %self.def.name, conversations = self.conversations, "scene_unload");
        self.player_id = None;
        self.pending_action = None;
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        Some(format!(
            "{} | characters: {} | conversations: {}",
            self.def.name,
            world.character_count(),
            self.conversations
        ))
    }
}

impl AdventureScene {
    fn player_position(&self, world: &SceneWorld) -> Option<Vec2> {
        self.player_id
            .and_then(|id| world.character(id))
            .map(|player| player.position())
    }

    fn resolve_click_target(&self, world: &SceneWorld, point: Vec2) -> ClickTarget {
        if let Some(id) = world
            .character_at(point, CHARACTER_PICK_RADIUS)
            .filter(|id| Some(*id) != self.player_id)
        {
            return ClickTarget::Character(id);
        }
        if let Some(exit) = self.def.exit_at(point) {
            return ClickTarget::Exit {
                name: exit.name.clone(),
                target_scene: SceneKey::new(exit.target_scene.clone()),
                walk_to: exit.walk_to,
            };
        }
        ClickTarget::Ground(point)
    }

    /// Starts the player walking toward whatever was clicked. Returns a
    /// command only when the action completes without walking.
    fn handle_click(&mut self, world: &mut SceneWorld, point: Vec2) -> SceneCommand {
        let Some(player_id) = self.player_id else {
            debug!(scene = %self.def.name, "click_ignored_no_player");
            return SceneCommand::None;
        };
        let Some(player_position) = self.player_position(world) else {
            return SceneCommand::None;
        };

        let target = self.resolve_click_target(world, point);
        let (destination, action) = match target {
            ClickTarget::Ground(point) => (point, None),
            ClickTarget::Exit {
                name,
                target_scene,
                walk_to,
            } => (
                walk_to,
                Some(PendingAction::UseExit {
                    exit_name: name,
                    target_scene,
                }),
            ),
            ClickTarget::Character(id) => {
                let Some(npc_position) = world.character(id).map(|npc| npc.position()) else {
                    return SceneCommand::None;
                };
                (
                    approach_point(player_position, npc_position, TALK_DISTANCE),
                    Some(PendingAction::TalkTo(id)),
                )
            }
        };

        match world.walk_to(player_id, destination) {
            WalkOutcome::Started => {
                self.pending_action = action;
                SceneCommand::None
            }
            WalkOutcome::AlreadyThere => {
                self.pending_action = None;
                match action {
                    Some(action) => self.complete_action(world, action),
                    None => SceneCommand::None,
                }
            }
            WalkOutcome::Unreachable | WalkOutcome::UnknownCharacter => {
                self.pending_action = None;
                info!(
                    scene = %self.def.name,
                    x = destination.x,
                    y = destination.y,
                    "click_unreachable"
                );
                SceneCommand::None
            }
        }
    }

    fn complete_action(&mut self, world: &SceneWorld, action: PendingAction) -> SceneCommand {
        match action {
            PendingAction::UseExit {
                exit_name,
                target_scene,
            } => {
                info!(
                    scene = %self.def.name,
                    exit = %exit_name,
                    target = %target_scene,
                    "exit_used"
                );
                SceneCommand::SwitchTo(target_scene)
            }
            PendingAction::TalkTo(id) => {
                let Some(npc) = world.character(id) else {
                    return SceneCommand::None;
                };
                self.conversations += 1;
                info!(scene = %self.def.name, character = npc.name(), "talk_to");
                SceneCommand::None
            }
        }
    }
}
