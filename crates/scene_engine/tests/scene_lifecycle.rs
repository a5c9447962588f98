//! End-to-end behaviour of the database, notifications and scene lifecycle

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use approx::assert_relative_eq;
use scene_engine::prelude::*;

fn setup() -> (EngineContext, SceneManager) {
    let ctx = EngineContext::new(BlobCodec::default()).unwrap();
    let manager = SceneManager::new(&ctx, PersistenceConfig::default());
    (ctx, manager)
}

fn spawn_with_transform(ctx: &mut EngineContext, scene: Scene, position: Vec3) -> Entity {
    let entity = Entity::create(ctx).unwrap();
    entity
        .add_new(ctx, Transform::new().with_position(position))
        .unwrap();
    entity.assign_to_scene(ctx, scene).unwrap();
    entity
}

#[test]
fn property_changes_notify_once_per_real_change() {
    let (mut ctx, mut manager) = setup();
    let level = manager.new_scene(&mut ctx, "level", None).unwrap();
    manager.load_scene(&mut ctx, level).unwrap();
    let entity = spawn_with_transform(&mut ctx, level, Vec3::zeros());

    let properties = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&properties);
    ctx.bus_mut()
        .subscribe_component::<Transform, _>(move |_, event| sink.borrow_mut().push(event.property));

    let transform = entity.component::<Transform>(ctx.database()).unwrap();
    let target = Vec3::new(1.0, 2.0, 3.0);
    transform.update(&mut ctx, |t| t.set_position(target)).unwrap();
    assert_eq!(*properties.borrow(), vec!["Position"]);

    transform.update(&mut ctx, |t| t.set_position(target)).unwrap();
    assert_eq!(properties.borrow().len(), 1);
}

#[test]
fn moving_an_entity_moves_its_components() {
    let (mut ctx, mut manager) = setup();
    let first = manager.new_scene(&mut ctx, "first", None).unwrap();
    let second = manager.new_scene(&mut ctx, "second", None).unwrap();
    let entity = spawn_with_transform(&mut ctx, first, Vec3::zeros());
    entity.add_new(&mut ctx, Collider::new()).unwrap();

    entity.assign_to_scene(&mut ctx, second).unwrap();

    let db = ctx.database();
    assert!(first.entities_with(db, &[ComponentKind::Transform]).is_empty());
    assert_eq!(second.entities_with(db, &[ComponentKind::Transform]), vec![entity]);
    assert_eq!(
        second.entities_with(db, &[ComponentKind::Transform, ComponentKind::Collider]),
        vec![entity]
    );
    assert_eq!(first.component_count(db), 0);
    assert!(db.integrity_violations().is_empty());
}

#[test]
fn destroying_a_scene_releases_everything_in_it() {
    let (mut ctx, mut manager) = setup();
    let level = manager.new_scene(&mut ctx, "level", None).unwrap();
    manager.load_scene(&mut ctx, level).unwrap();

    let mut ids = Vec::new();
    for _ in 0..2 {
        let entity = Entity::create(&mut ctx).unwrap();
        let collider = entity.add_new(&mut ctx, Collider::new()).unwrap();
        entity.assign_to_scene(&mut ctx, level).unwrap();
        ids.push((entity.id(), collider.id()));
    }

    level.destroy(&mut ctx).unwrap();

    let db = ctx.database();
    for (entity, collider) in ids {
        assert_eq!(Entity::instance(db, entity), None);
        assert_eq!(ComponentId::instance(db, collider), None);
    }
    assert_eq!(db.component_count(), 0);
    assert_eq!(ctx.current(), None);
}

#[test]
fn second_component_of_a_type_is_rejected() {
    let (mut ctx, _) = setup();
    let entity = Entity::create(&mut ctx).unwrap();
    entity.add_new(&mut ctx, Transform::new()).unwrap();

    let result = entity.add_new(&mut ctx, Transform::new());

    assert!(matches!(result, Err(EcsError::DuplicateComponentType { .. })));
    assert_eq!(entity.component_count(ctx.database()), 1);
    assert_eq!(ctx.database().component_count_of_kind(ComponentKind::Transform), 1);
}

#[test]
fn restart_discards_changes_since_first_load() {
    let (mut ctx, mut manager) = setup();
    let a = manager.new_scene(&mut ctx, "a", None).unwrap();
    let b = manager.new_scene(&mut ctx, "b", None).unwrap();
    spawn_with_transform(&mut ctx, a, Vec3::zeros());
    let ship = spawn_with_transform(&mut ctx, b, Vec3::new(1.0, 0.0, 0.0));

    manager.load_scene(&mut ctx, a).unwrap();
    manager.load_scene(&mut ctx, b).unwrap();

    let transform = ship.component::<Transform>(ctx.database()).unwrap();
    transform
        .update(&mut ctx, |t| t.set_position(Vec3::new(9.0, 9.0, 9.0)))
        .unwrap();
    ship.add_new(&mut ctx, Movement::new()).unwrap();
    let late = spawn_with_transform(&mut ctx, b, Vec3::zeros());

    manager.restart_current_scene(&mut ctx).unwrap();

    let db = ctx.database();
    assert_eq!(b.entities(db), vec![ship]);
    assert!(!late.exists(db));
    assert!(!ship.has::<Movement>(db));
    assert_relative_eq!(ship.get::<Transform>(db).unwrap().position().x, 1.0);
    assert!(db.integrity_violations().is_empty());
}

#[test]
fn disk_round_trip_reproduces_ids_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = EngineContext::new(BlobCodec::new(CodecKind::Text)).unwrap();
    let mut manager = SceneManager::new(
        &ctx,
        PersistenceConfig {
            save_directory: dir.path().to_path_buf(),
            codec: CodecKind::Text,
            ..PersistenceConfig::default()
        },
    );
    let level = manager.new_scene(&mut ctx, "level", None).unwrap();
    let global = ctx.global();
    let hud = spawn_with_transform(&mut ctx, global, Vec3::zeros());
    hud.add_new(&mut ctx, AudioListener::default()).unwrap();
    let ship = spawn_with_transform(&mut ctx, level, Vec3::new(4.0, 5.0, 6.0));
    let engine_sound = ship
        .add_new(&mut ctx, AudioSource::new("engine.wav").looped())
        .unwrap();
    manager.load_scene(&mut ctx, level).unwrap();

    let ids_before = ctx.database().components_of(ship);
    assert!(manager.disk_save(&ctx, "level"));
    assert!(manager.disk_restore(&mut ctx, "level"));

    let db = ctx.database();
    assert_eq!(db.components_of(ship), ids_before);
    assert_eq!(level.entities(db), vec![ship]);
    assert_eq!(global.entities(db), vec![hud]);
    assert_eq!(ship.get::<Transform>(db).unwrap().position(), Vec3::new(4.0, 5.0, 6.0));
    let sound = engine_sound.get(db).unwrap();
    assert_eq!(sound.asset_name(), "engine.wav");
    assert!(sound.is_looped());
}

#[test]
fn restart_after_disk_restore_keeps_the_loaded_save() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = PersistenceConfig {
        save_directory: dir.path().to_path_buf(),
        ..PersistenceConfig::default()
    };

    let ship = {
        let mut ctx = EngineContext::new(BlobCodec::default()).unwrap();
        let mut manager = SceneManager::new(&ctx, persistence.clone());
        let level = manager.new_scene(&mut ctx, "level", None).unwrap();
        let ship = spawn_with_transform(&mut ctx, level, Vec3::new(3.0, 0.0, 0.0));
        manager.load_scene(&mut ctx, level).unwrap();
        assert!(manager.disk_save(&ctx, "level"));
        ship
    };

    let mut ctx = EngineContext::new(BlobCodec::default()).unwrap();
    let mut manager = SceneManager::new(&ctx, persistence);
    let level = manager.new_scene(&mut ctx, "level", None).unwrap();
    assert!(manager.disk_restore(&mut ctx, "level"));
    assert_eq!(level.entities(ctx.database()), vec![ship]);

    let transform = ship.component::<Transform>(ctx.database()).unwrap();
    transform
        .update(&mut ctx, |t| t.set_position(Vec3::new(8.0, 8.0, 8.0)))
        .unwrap();
    manager.restart_current_scene(&mut ctx).unwrap();

    let db = ctx.database();
    assert_eq!(level.entities(db), vec![ship]);
    assert_relative_eq!(ship.get::<Transform>(db).unwrap().position().x, 3.0);
    assert!(db.integrity_violations().is_empty());
}

#[test]
fn hidden_scenes_stay_silent() {
    let (mut ctx, mut manager) = setup();
    let visible = manager.new_scene(&mut ctx, "visible", None).unwrap();
    let hidden = manager.new_scene(&mut ctx, "hidden", None).unwrap();
    manager.load_scene(&mut ctx, visible).unwrap();

    let count = Rc::new(RefCell::new(0));
    let component_sink = Rc::clone(&count);
    ctx.bus_mut()
        .subscribe_component::<Transform, _>(move |_, _| *component_sink.borrow_mut() += 1);
    let entity_sink = Rc::clone(&count);
    ctx.bus_mut()
        .subscribe_entity(move |_, _| *entity_sink.borrow_mut() += 1);
    let scene_sink = Rc::clone(&count);
    ctx.bus_mut()
        .subscribe_scene(move |_, _| *scene_sink.borrow_mut() += 1);

    let entity = spawn_with_transform(&mut ctx, hidden, Vec3::zeros());
    let transform = entity.component::<Transform>(ctx.database()).unwrap();
    transform
        .update(&mut ctx, |t| t.translate(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    entity.add_new(&mut ctx, Collider::new()).unwrap();
    assert_eq!(*count.borrow(), 0);

    entity.assign_to_scene(&mut ctx, visible).unwrap();
    assert_eq!(*count.borrow(), 1);
    transform
        .update(&mut ctx, |t| t.translate(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn snapshots_round_trip_without_changes() {
    let (mut ctx, mut manager) = setup();
    let level = manager.new_scene(&mut ctx, "level", None).unwrap();
    let entity = spawn_with_transform(&mut ctx, level, Vec3::new(1.0, 1.0, 1.0));
    entity
        .add_new(&mut ctx, Movement::new().with_linear_velocity(Vec3::new(0.0, 0.5, 0.0)))
        .unwrap();

    let scene_state = level.save_state(&ctx).unwrap();
    let entity_state = entity.save_state(&ctx).unwrap();
    let before = ctx.database().components_of(entity);

    level.restore_state(&mut ctx, &scene_state).unwrap();
    entity.restore_state(&mut ctx, &entity_state).unwrap();

    let db = ctx.database();
    assert_eq!(db.components_of(entity), before);
    assert_eq!(level.entities(db), vec![entity]);
    assert_eq!(
        entity.get::<Movement>(db).unwrap().linear_velocity(),
        Vec3::new(0.0, 0.5, 0.0)
    );
}

#[derive(Default)]
struct Tracker {
    visible: Vec<Entity>,
}

impl DomainSystem for Tracker {
    fn name(&self) -> &str {
        "tracker"
    }

    fn update(&mut self, _ctx: &mut EngineContext, _elapsed: Duration) -> Result<(), SystemError> {
        Ok(())
    }

    fn on_scene_changed(&mut self, _db: &Database, event: &SceneChanged) {
        match event.kind {
            SceneEventKind::EntityAdded => self.visible.push(event.entity),
            SceneEventKind::EntityRemoved => self.visible.retain(|e| *e != event.entity),
        }
    }
}

#[test]
fn systems_follow_the_visible_world_across_switches() {
    let config = EngineConfig {
        create_default_scene: false,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    let tracker = engine.add_system(Tracker::default()).unwrap();

    let a = engine.new_scene("a", None).unwrap();
    let b = engine.new_scene("b", None).unwrap();
    let global = engine.context().global();
    let ctx = engine.context_mut();
    let hud = spawn_with_transform(ctx, global, Vec3::zeros());
    let in_a = spawn_with_transform(ctx, a, Vec3::zeros());
    let in_b = spawn_with_transform(ctx, b, Vec3::zeros());
    tracker.borrow_mut().visible.clear();

    engine.initialize().unwrap();
    engine.load_scene(a).unwrap();
    assert_eq!(tracker.borrow().visible, vec![hud, in_a]);

    engine.load_next().unwrap();
    assert_eq!(tracker.borrow().visible, vec![hud, in_b]);

    engine.update(Duration::from_millis(16)).unwrap();
    engine.dispose();
    assert_eq!(tracker.borrow().visible, vec![hud]);
}
