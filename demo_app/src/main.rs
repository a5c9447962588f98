//! Scene demo application
//!
//! Two small domain systems watch a pair of scenes while the application
//! flies an asteroid around, switches scenes, and exercises quick save,
//! restart and disk save.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use scene_engine::prelude::*;

/// Serves every asset as its own name, counting loads
#[derive(Default)]
struct DemoAssets {
    loaded: HashMap<String, Rc<dyn Any>>,
}

impl ResourceProvider for DemoAssets {
    fn load_any(&mut self, asset_name: &str) -> Result<Rc<dyn Any>, ResourceError> {
        if !asset_name.ends_with(".wav") {
            return Err(ResourceError::Load {
                asset: asset_name.to_string(),
                message: "only .wav sounds are bundled".to_string(),
            });
        }
        let asset = self.loaded.entry(asset_name.to_string()).or_insert_with(|| {
            log::debug!("Loading asset '{asset_name}'");
            Rc::new(asset_name.to_string()) as Rc<dyn Any>
        });
        Ok(Rc::clone(asset))
    }

    fn unload_all(&mut self) {
        log::info!("Unloading {} assets", self.loaded.len());
        self.loaded.clear();
    }
}

/// Integrates linear and angular velocities of visible entities
struct MotionSystem;

impl DomainSystem for MotionSystem {
    fn name(&self) -> &str {
        "motion"
    }

    fn update(&mut self, ctx: &mut EngineContext, elapsed: Duration) -> Result<(), SystemError> {
        let visibility = ctx.visibility();
        let moving: Vec<_> = ctx
            .database()
            .entities_with(&[ComponentKind::Transform, ComponentKind::Movement])
            .into_iter()
            .filter(|entity| entity.scene(ctx.database()).is_some_and(|scene| visibility.admits(scene)))
            .filter_map(|entity| {
                let movement = entity.get::<Movement>(ctx.database())?;
                let velocities = (movement.linear_velocity(), movement.angular_velocity());
                Some((entity.component::<Transform>(ctx.database())?, velocities))
            })
            .collect();

        let dt = elapsed.as_secs_f32();
        for (transform, (linear, angular)) in moving {
            transform.update(ctx, |t| {
                // Angular velocity is degrees per second around a local axis
                [t.translate(linear * dt), t.rotate_local(angular, angular.norm() * dt)]
                    .into_iter()
                    .flatten()
            })?;
        }
        Ok(())
    }
}

/// Tracks sounds of the visible world through the resource provider
#[derive(Default)]
struct AudioSystem {
    provider: Option<SharedResourceProvider>,
    sounds: HashMap<Entity, Rc<String>>,
}

impl AudioSystem {
    fn acquire(&mut self, db: &Database, entity: Entity) {
        let (Some(source), Some(provider)) = (entity.get::<AudioSource>(db), &self.provider) else {
            return;
        };
        match provider.borrow_mut().load::<String>(source.asset_name()) {
            Ok(sound) => {
                self.sounds.insert(entity, sound);
            }
            Err(e) => log::warn!("No sound for {entity}: {e}"),
        }
    }
}

impl DomainSystem for AudioSystem {
    fn name(&self) -> &str {
        "audio"
    }

    fn initialize(&mut self, ctx: &mut EngineContext) -> Result<(), SystemError> {
        ctx.bus_mut().subscribe_component::<AudioSource, _>(|_, event| {
            log::info!("{} of {} changed {}", event.component.id(), event.entity, event.property);
        });
        Ok(())
    }

    fn update(&mut self, _ctx: &mut EngineContext, _elapsed: Duration) -> Result<(), SystemError> {
        Ok(())
    }

    fn accept_resource_provider(&mut self, provider: Option<SharedResourceProvider>) {
        if provider.is_some() {
            self.provider = provider;
        }
    }

    fn clean_up_after_scene_switch(&mut self) {
        log::info!("Audio tracks {} sounds after the switch", self.sounds.len());
    }

    fn on_scene_changed(&mut self, db: &Database, event: &SceneChanged) {
        match event.kind {
            SceneEventKind::EntityAdded => self.acquire(db, event.entity),
            SceneEventKind::EntityRemoved => {
                self.sounds.remove(&event.entity);
            }
        }
    }

    fn on_entity_changed(&mut self, db: &Database, event: &EntityChanged) {
        if event.component_kind != ComponentKind::AudioSource {
            return;
        }
        match event.kind {
            EntityEventKind::ComponentAdded | EntityEventKind::ComponentDeserialized => {
                self.acquire(db, event.entity);
            }
            EntityEventKind::ComponentRemoved => {
                self.sounds.remove(&event.entity);
            }
        }
    }

    fn dispose(&mut self) {
        self.sounds.clear();
        self.provider = None;
    }
}

#[derive(Default)]
struct SceneDemo {
    frame: u32,
    asteroid: Option<Entity>,
}

impl SceneDemo {
    fn spawn(ctx: &mut EngineContext, scene: Scene, name: &str, position: Vec3) -> Result<Entity, EcsError> {
        let entity = Entity::create(ctx)?;
        entity.add_new(ctx, EntityInfo::named(name))?;
        entity.add_new(ctx, Transform::new().with_position(position))?;
        entity.assign_to_scene(ctx, scene)?;
        Ok(entity)
    }

    fn report(engine: &Engine, label: &str) {
        let ctx = engine.context();
        let db = ctx.database();
        let current = ctx
            .current()
            .and_then(|scene| engine.scenes().name_of(scene))
            .unwrap_or("<none>");
        log::info!(
            "[{label}] current '{current}': {} scenes, {} entities, {} components",
            db.scene_count(),
            db.entity_count(),
            db.component_count()
        );
    }
}

impl Application for SceneDemo {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        engine.add_system(MotionSystem)?;
        engine.add_system(AudioSystem::default())?;

        let field = engine.new_scene("asteroid_field", Some(Rc::new(RefCell::new(DemoAssets::default()))))?;
        let nebula = engine.new_scene("nebula", Some(Rc::new(RefCell::new(DemoAssets::default()))))?;

        let global = engine.context().global();
        let ctx = engine.context_mut();
        let hud = Self::spawn(ctx, global, "hud", Vec3::zeros())?;
        hud.add_new(ctx, AudioListener::new())?;

        let asteroid = Self::spawn(ctx, field, "asteroid", Vec3::new(0.0, 0.0, -20.0))?;
        asteroid.add_new(
            ctx,
            Movement::new()
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0))
                .with_angular_velocity(Vec3::new(0.0, 15.0, 0.0)),
        )?;
        asteroid.add_new(ctx, Collider::dynamic(50.0))?;
        asteroid.add_new(ctx, AudioSource::new("rumble.wav").positional().looped())?;
        self.asteroid = Some(asteroid);

        let station = Self::spawn(ctx, nebula, "station", Vec3::new(10.0, 0.0, -40.0))?;
        station.add_new(ctx, AudioSource::new("hum.wav").autoplay())?;

        engine.initialize()?;
        engine.load_scene(field)?;
        Self::report(engine, "start");
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _elapsed: Duration) -> Result<(), AppError> {
        self.frame += 1;
        match self.frame {
            30 => {
                engine.quick_save()?;
                Self::report(engine, "quick save");
            }
            45 => {
                let asteroid = self
                    .asteroid
                    .ok_or_else(|| AppError::Custom("asteroid was never spawned".to_string()))?;
                let ctx = engine.context_mut();
                let sound = asteroid
                    .component::<AudioSource>(ctx.database())
                    .ok_or_else(|| AppError::Custom(format!("{asteroid} lost its sound")))?;
                sound.update(ctx, AudioSource::play)?;
            }
            60 => {
                engine.load_next()?;
                Self::report(engine, "next scene");
            }
            90 => {
                engine.quick_restore()?;
                Self::report(engine, "quick restore");
            }
            120 => {
                if engine.disk_save() {
                    Self::report(engine, "disk save");
                }
            }
            150 => {
                engine.restart_current_scene()?;
                Self::report(engine, "restart");
            }
            180 => {
                if engine.disk_restore("asteroid_field") {
                    Self::report(engine, "disk restore");
                }
            }
            200 => engine.quit(),
            _ => {}
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        if let Some(position) = self
            .asteroid
            .and_then(|asteroid| asteroid.get::<Transform>(engine.context().database()))
            .map(Transform::position)
        {
            log::info!("Asteroid ended at {position:?}");
        }
        for (system, time) in engine.system_timings() {
            log::info!("System '{system}' averaged {time:?} per frame");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig {
        create_default_scene: false,
        persistence: PersistenceConfig {
            save_directory: std::env::temp_dir().join("scene_demo"),
            ..PersistenceConfig::default()
        },
        ..EngineConfig::default()
    };

    let mut app = SceneDemo::default();
    Engine::run(config, &mut app)?;
    Ok(())
}
