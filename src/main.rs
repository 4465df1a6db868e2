//! Imagine - A 2D scene runtime on a sparse-set ECS
//!
//! Runs the demo scene (or a scene loaded from disk) headless for a fixed
//! number of frames and reports where the simulated bodies ended up.

mod demo;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use imagine_core::{GameTime, Transform};
use imagine_scene::{Name, RigidBody2D, Scene, SceneSerializer};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::demo::LogRenderer;
use crate::settings::RuntimeSettings;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting Imagine runtime...");

    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = RuntimeSettings::load(settings_path.as_deref());

    let scene = match &settings.demo.scene_path {
        Some(path) => {
            let mut scene = Scene::new("untitled");
            SceneSerializer::load(&mut scene, path)
                .with_context(|| format!("Failed to load scene from {:?}", path))?;
            scene
        }
        None => demo::build_scene(),
    };
    let mut scene = scene.with_physics_config(settings.physics.clone());
    scene.on_viewport_resize(settings.viewport.width, settings.viewport.height);

    let mut time = GameTime::new(settings.time.clone());
    let mut renderer = LogRenderer::default();

    scene
        .on_runtime_start()
        .context("Failed to start runtime session")?;
    for _ in 0..settings.demo.frames {
        time.advance_fixed();
        scene
            .on_update_runtime(time.delta_time, &mut renderer)
            .context("Runtime frame failed")?;
    }
    scene.on_runtime_stop();

    info!(
        "Simulated {} frames ({:.2}s, {} rendered, last fps {:.1})",
        time.frame_count,
        time.total_time,
        renderer.frames,
        scene.fps()
    );
    report_bodies(&scene);

    if let Some(path) = &settings.demo.save_path {
        SceneSerializer::save(&scene, path)
            .with_context(|| format!("Failed to save scene to {:?}", path))?;
    }

    Ok(())
}

fn report_bodies(scene: &Scene) {
    for entity in scene.entities() {
        if !scene.has_component::<RigidBody2D>(entity) {
            continue;
        }
        let (Ok(name), Ok(transform)) = (
            scene.get_component::<Name>(entity),
            scene.get_component::<Transform>(entity),
        ) else {
            continue;
        };
        info!(
            "{:>8}: x = {:7.3}, y = {:7.3}, angle = {:6.3}",
            name,
            transform.position.x,
            transform.position.y,
            transform.angle_z()
        );
    }
}
