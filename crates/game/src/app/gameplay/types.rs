/// What a left click landed on, in pick priority order.
#[derive(Debug, Clone, PartialEq)]
enum ClickTarget {
    Character(EntityId),
    Exit {
        name: String,
        target_scene: SceneKey,
        walk_to: Vec2,
    },
    Ground(Vec2),
}

/// Deferred until the player reaches the end of the current walk.
#[derive(Debug, Clone, PartialEq)]
enum PendingAction {
    UseExit {
        exit_name: String,
        target_scene: SceneKey,
    },
    TalkTo(EntityId),
}

struct AdventureScene {
    def: SceneDef,
    solver: SolverOptions,
    player_id: Option<EntityId>,
    pending_action: Option<PendingAction>,
    conversations: u32,
}

impl AdventureScene {
    fn new(def: SceneDef, solver: SolverOptions) -> Self {
        Self {
            def,
            solver,
            player_id: None,
            pending_action: None,
            conversations: 0,
        }
    }
}
