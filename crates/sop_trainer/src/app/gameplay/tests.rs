    use super::*;
    use sop_core::{
        parse_task_list, run_session, InputFeed, LoopConfig, ProcedureOutcome, SessionConfig,
        SessionReport, StopReason, ROOT_TASK_NAME,
    };

    const TASKS: &str = include_str!("../../../../../assets/tasks.json");
    const DESKTOP_SCRIPT: &str =
        include_str!("../../../../../assets/scripts/desktop_pour_in_order.json");
    const MOBILE_SCRIPT: &str =
        include_str!("../../../../../assets/scripts/mobile_out_of_order.json");
    const XR_SCRIPT: &str = include_str!("../../../../../assets/scripts/xr_pour_in_order.json");

    const DT: f32 = 1.0 / 60.0;

    fn bench() -> (Session, SimWorld, Scenario) {
        let tasks = parse_task_list(TASKS).expect("bundled task list");
        let mut session = Session::new(SessionConfig::default(), &tasks).expect("session");
        let mut world = SimWorld::default();
        let scenario = spawn_scenario(&mut world, &mut session);
        (session, world, scenario)
    }

    struct Run {
        report: SessionReport,
        world: SimWorld,
        scenario: Scenario,
        presentation: LogPresentation,
    }

    fn run_script(mode: Option<Mode>, script: &str) -> Run {
        let (mut session, mut world, scenario) = bench();
        let mut feed = parse_script(script, &scenario, &world).expect("script");
        let mut presentation = LogPresentation::default();
        if let Some(mode) = mode {
            session
                .switch_mode(mode, &mut world, &mut presentation)
                .expect("switch mode");
        }
        let report = run_session(
            &LoopConfig::default(),
            &mut session,
            &mut world,
            &mut presentation,
            &mut feed,
        )
        .expect("run");
        Run {
            report,
            world,
            scenario,
            presentation,
        }
    }

    fn pose(offset: Vec3) -> Pose {
        Pose {
            offset,
            rotation_euler: Vec3::ZERO,
        }
    }

    #[test]
    fn children_follow_parent_and_detach_in_place() {
        let mut world = SimWorld::default();
        let anchor = world.spawn("anchor", Vec3::new(0.0, 1.0, 0.0), 0.05);
        let held = world.spawn("held", Vec3::new(2.0, 0.0, 0.0), 0.1);

        world.attach_to(held, anchor, pose(Vec3::new(0.0, -0.5, 0.0)));
        assert_eq!(world.position(held), Some(Vec3::new(0.0, 0.5, 0.0)));
        assert_eq!(world.parent_of(held), Some(anchor));

        world.set_position(anchor, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(world.position(held), Some(Vec3::new(1.0, 0.5, 0.0)));

        world.detach(held);
        world.set_position(anchor, Vec3::ZERO);
        assert_eq!(world.position(held), Some(Vec3::new(1.0, 0.5, 0.0)));
        assert_eq!(world.parent_of(held), None);
    }

    #[test]
    fn moving_a_parented_entity_rewrites_its_offset() {
        let mut world = SimWorld::default();
        let anchor = world.spawn("anchor", Vec3::new(1.0, 0.0, 0.0), 0.05);
        let held = world.spawn("held", Vec3::ZERO, 0.1);
        world.attach_to(held, anchor, pose(Vec3::ZERO));

        world.set_position(held, Vec3::new(1.0, 2.0, 0.0));
        world.set_position(anchor, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(world.position(held), Some(Vec3::new(3.0, 2.0, 0.0)));
    }

    #[test]
    fn spheres_intersect_when_radii_overlap() {
        let mut world = SimWorld::default();
        let a = world.spawn("a", Vec3::ZERO, 0.1);
        let b = world.spawn("b", Vec3::new(0.15, 0.0, 0.0), 0.1);
        let far = world.spawn("far", Vec3::new(1.0, 0.0, 0.0), 0.1);

        assert!(world.intersects(a, b));
        assert!(!world.intersects(a, far));
        assert!(!world.intersects(a, a));
        assert!(!world.intersects(a, EntityId(999)));
    }

    #[test]
    fn respawn_returns_entity_to_spawn_when_finished() {
        let mut world = SimWorld::default();
        let anchor = world.spawn("anchor", Vec3::ZERO, 0.05);
        let cylinder = world.spawn("cylinder", Vec3::new(1.0, 0.0, 0.0), 0.1);
        world.attach_to(cylinder, anchor, pose(Vec3::new(0.0, 2.0, 0.0)));

        world.play_animation(cylinder, Animation::Respawn);
        assert!(world.is_animating(cylinder));
        assert!(world.advance(0.25).is_empty());
        assert_eq!(
            world.advance(0.25),
            vec![WorldSignal::AnimationFinished {
                entity: cylinder,
                animation: Animation::Respawn,
            }]
        );
        assert!(!world.is_animating(cylinder));
        assert_eq!(world.position(cylinder), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(world.parent_of(cylinder), None);
    }

    #[test]
    fn pour_animation_keeps_position() {
        let mut world = SimWorld::default();
        let cylinder = world.spawn("cylinder", Vec3::ZERO, 0.1);
        world.set_position(cylinder, Vec3::new(0.5, 0.0, 0.0));

        world.play_animation(cylinder, Animation::Pour);
        assert!(world.advance(1.0).is_empty());
        assert_eq!(world.advance(0.5).len(), 1);
        assert_eq!(world.position(cylinder), Some(Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn bench_spawns_named_entities() {
        let (session, world, scenario) = bench();
        assert_eq!(scenario.cylinders.len(), 3);
        let b = scenario.cylinder("B").expect("cylinder B");
        assert_eq!(world.name_of(b), Some("cylinder_b"));
        assert_eq!(world.entity_named("clipboard"), Some(scenario.clipboard));
        assert_eq!(
            world.parent_of(scenario.left.grabber),
            Some(scenario.left.anchor)
        );
        assert_eq!(session.interaction().selectors().len(), 3);
        assert!(session.interaction().is_interactable(scenario.extinguisher));
    }

    #[test]
    fn reticle_over_a_cylinder_highlights_it() {
        let (mut session, mut world, scenario) = bench();
        let mut presentation = LogPresentation::default();
        session
            .switch_mode(Mode::Desktop, &mut world, &mut presentation)
            .expect("switch mode");
        let c = scenario.cylinder("C").expect("cylinder C");

        world.set_position(scenario.pointer.grabber, Vec3::new(0.6, 1.0, 0.0));
        session
            .tick(DT, &mut world, &mut presentation)
            .expect("tick");
        assert_eq!(world.highlighted(), &[c]);
    }

    #[test]
    fn script_resolves_entities_and_controller_poses() {
        let (_session, world, scenario) = bench();
        let raw = r#"[
            { "tick": 3, "action": { "type": "xr", "hand": "left", "component": "squeeze", "value": 0.7 } },
            { "tick": 1, "action": { "type": "move", "entity": "cylinder_a", "position": [0.0, 2.0, 0.0] } },
            { "tick": 1, "action": { "type": "xrPose", "hand": "right", "position": [1.0, 1.0, 1.0] } },
            { "tick": 5, "action": { "type": "switchMode", "mode": "mobile" } }
        ]"#;
        let mut feed = parse_script(raw, &scenario, &world).expect("script");

        assert_eq!(
            feed.commands_for_tick(1),
            vec![
                FeedCommand::Place {
                    entity: scenario.cylinder("A").expect("cylinder A"),
                    position: Vec3::new(0.0, 2.0, 0.0),
                },
                FeedCommand::Place {
                    entity: scenario.right.anchor,
                    position: Vec3::new(1.0, 1.0, 1.0),
                },
            ]
        );
        assert_eq!(
            feed.commands_for_tick(3),
            vec![FeedCommand::Input(InputSignal::Xr {
                hand: Handedness::Left,
                component: XrComponent::Squeeze,
                value: 0.7,
                pressed: true,
            })]
        );
        assert_eq!(
            feed.commands_for_tick(5),
            vec![FeedCommand::SwitchMode(Mode::Mobile)]
        );
        assert!(feed.is_exhausted());
    }

    #[test]
    fn script_rejects_unknown_entities_and_modes() {
        let (_session, world, scenario) = bench();

        let unknown_entity = r#"[
            { "tick": 0, "action": { "type": "pointer", "button": "left", "state": "pressed" } },
            { "tick": 1, "action": { "type": "move", "entity": "cylinder_z", "position": [0.0, 0.0, 0.0] } }
        ]"#;
        match parse_script(unknown_entity, &scenario, &world) {
            Err(ScriptError::UnknownEntity { index, name }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "cylinder_z");
            }
            other => panic!("expected unknown entity, got {other:?}"),
        }

        let unknown_mode = r#"[{ "tick": 0, "action": { "type": "switchMode", "mode": "vr" } }]"#;
        assert!(matches!(
            parse_script(unknown_mode, &scenario, &world),
            Err(ScriptError::UnknownMode { index: 0, .. })
        ));
    }

    #[test]
    fn script_parse_errors_carry_a_path() {
        let (_session, world, scenario) = bench();
        let raw = r#"[{ "tick": 0, "action": { "type": "pointer", "button": "thumb", "state": "pressed" } }]"#;
        match parse_script(raw, &scenario, &world) {
            Err(ScriptError::Parse { path, .. }) => assert!(path.starts_with("[0]"), "{path}"),
            other => panic!("expected parse error, got {other:?}"),
        }

        match parse_script("{}", &scenario, &world) {
            Err(ScriptError::Parse { path, .. }) => assert_eq!(path, "<root>"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn script_rejects_non_finite_positions() {
        let (_session, world, scenario) = bench();
        let raw = r#"[{ "tick": 0, "action": { "type": "xrPose", "hand": "left", "position": [1e39, 0.0, 0.0] } }]"#;
        assert!(matches!(
            parse_script(raw, &scenario, &world),
            Err(ScriptError::NonFinitePosition { index: 0 })
        ));
    }

    #[test]
    fn missing_script_file_is_an_io_error() {
        let (_session, world, scenario) = bench();
        let temp = tempfile::TempDir::new().expect("tempdir");
        let missing = temp.path().join("nope.json");
        assert!(matches!(
            load_script(&missing, &scenario, &world),
            Err(ScriptError::Io { .. })
        ));

        let present = temp.path().join("empty.json");
        fs::write(&present, "[]").expect("write script");
        let feed = load_script(&present, &scenario, &world).expect("empty script");
        assert!(feed.is_empty());
    }

    #[test]
    fn desktop_pours_in_order_and_resets() {
        let run = run_script(Some(Mode::Desktop), DESKTOP_SCRIPT);

        assert_eq!(run.report.stopped_by, StopReason::FeedExhausted);
        assert_eq!(run.report.outcomes, vec![ProcedureOutcome::Successful]);
        assert_eq!(run.presentation.banners(), &["success", "reset"]);
        assert_eq!(
            run.presentation.status_of(ROOT_TASK_NAME),
            Some(TaskStatus::Reset)
        );
        assert!(!run.presentation.fire_burning());
        for (label, cylinder) in &run.scenario.cylinders {
            assert!(run.world.is_animating(*cylinder), "{label} should respawn");
        }
    }

    #[test]
    fn mobile_out_of_order_pour_starts_fire_until_extinguished() {
        let run = run_script(Some(Mode::Mobile), MOBILE_SCRIPT);

        assert_eq!(run.report.stopped_by, StopReason::FeedExhausted);
        assert_eq!(run.report.outcomes, vec![ProcedureOutcome::Failure]);
        assert_eq!(run.presentation.banners(), &["failure", "reset"]);
        assert!(!run.presentation.fire_burning());
        // Extinguishing resets well before the delayed reset would.
        assert!(run.report.ticks_run < 200, "ticks {}", run.report.ticks_run);
        assert_eq!(
            run.presentation.status_of("pour_c_into_a"),
            Some(TaskStatus::Reset)
        );
    }

    #[test]
    fn xr_controllers_pour_in_order() {
        let run = run_script(Some(Mode::Xr), XR_SCRIPT);

        assert_eq!(run.report.final_mode, Mode::Xr);
        assert_eq!(run.report.outcomes, vec![ProcedureOutcome::Successful]);
        assert_eq!(run.presentation.banners(), &["success", "reset"]);
    }

    #[test]
    fn input_is_ignored_while_loading() {
        let run = run_script(None, DESKTOP_SCRIPT);

        assert_eq!(run.report.final_mode, Mode::Loading);
        assert!(run.report.outcomes.is_empty());
        assert!(run.presentation.banners().is_empty());
        assert!(run.world.highlighted().is_empty());
    }
