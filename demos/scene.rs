//! A small interactive scene: a lit ground plane, a parent-child pair of
//! spinning meshes, an animated sphere, a particle fountain, bloom on the
//! emissive torus, and click picking. Escape quits.

use std::sync::Arc;

use anyhow::Result;
use cairn::prelude::*;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowAttributes},
};

#[derive(Default)]
struct DemoApp {
    window: Option<Arc<Window>>,
    engine: Option<Engine>,
    scene: Option<DemoScene>,
    angle: f32,
}

struct DemoScene {
    ground: Handle,
    parent_node: Handle,
    child_node: Handle,
    torus: Handle,
    sphere_node: Handle,
    fountain: Handle,
}

impl DemoApp {
    fn build_scene(engine: &mut Engine) -> DemoScene {
        engine.set_camera(Vector3::new(0.0, 6.0, 12.0), Vector3::new(0.0, 1.0, 0.0));

        // Lighting: warm sun, a cool fill point light, shadows on.
        engine.set_ambient([0.15, 0.15, 0.18]);
        engine.set_directional_light(Vector3::new(0.4, -1.0, 0.3), [1.0, 0.95, 0.85]);
        engine.set_point_light(0, Vector3::new(-4.0, 3.0, 2.0), [0.3, 0.4, 1.0], 12.0);
        engine.shadow_enable(true);
        engine.set_fog(FogMode::Linear, [0.05, 0.05, 0.08]);
        engine.set_fog_range(15.0, 40.0, 0.02);
        engine.bloom_enable(true);
        engine.set_bloom(1.0, 0.8);

        let ground = engine.create_plane(30.0, 30.0);
        engine.set_mesh_color(ground, [0.4, 0.45, 0.4, 1.0]);

        let cube = engine.create_cube(1.5, 1.5, 1.5);
        engine.set_mesh_color(cube, [0.8, 0.3, 0.2, 1.0]);
        let parent_node = engine.node_create();
        engine.node_set_mesh(parent_node, cube);
        engine.node_set_position(parent_node, Vector3::new(0.0, 1.5, 0.0));

        let small_cube = engine.create_cube(0.6, 0.6, 0.6);
        engine.set_mesh_color(small_cube, [0.9, 0.8, 0.2, 1.0]);
        let child_node = engine.node_create();
        engine.node_set_mesh(child_node, small_cube);
        engine.node_set_position(child_node, Vector3::new(2.5, 0.0, 0.0));
        engine.node_set_parent(child_node, parent_node);

        let torus = engine.create_torus(2.0, 0.3, 48, 16);
        engine.set_mesh_color(torus, [0.2, 0.2, 0.2, 1.0]);
        engine.set_mesh_emissive(torus, [0.2, 0.8, 1.0], 3.0);

        // Sphere bobs up and down on a looping keyframe track.
        let sphere = engine.create_sphere(0.8, 24, 16);
        engine.set_mesh_color(sphere, [0.3, 0.6, 0.9, 1.0]);
        let sphere_node = engine.node_create();
        engine.node_set_mesh(sphere_node, sphere);
        engine.node_set_position(sphere_node, Vector3::new(-4.0, 1.0, 0.0));
        let bob = engine.anim_create();
        engine.anim_add_key(bob, TrackKind::Position, 0.0, Vector3::new(-4.0, 1.0, 0.0));
        engine.anim_add_key(bob, TrackKind::Position, 1.0, Vector3::new(-4.0, 3.0, 0.0));
        engine.anim_add_key(bob, TrackKind::Position, 2.0, Vector3::new(-4.0, 1.0, 0.0));
        engine.anim_bind(bob, sphere_node);
        engine.anim_play(bob, true);

        let fountain = engine.emitter_create(1024);
        if let Some(emitter) = engine.emitter_mut(fountain) {
            emitter.position = Vector3::new(4.0, 0.2, 0.0);
            emitter.velocity = Vector3::new(0.0, 5.0, 0.0);
            emitter.spread = Vector3::new(1.5, 0.5, 1.5);
            emitter.gravity = Vector3::new(0.0, -9.8, 0.0);
            emitter.rate = 120.0;
            emitter.life_min = 0.8;
            emitter.life_max = 1.6;
            emitter.start_color = [1.0, 0.7, 0.2, 1.0];
            emitter.end_color = [1.0, 0.1, 0.0, 0.0];
            emitter.start_size = 0.25;
            emitter.end_size = 0.05;
            emitter.emitting = true;
        }

        DemoScene {
            ground,
            parent_node,
            child_node,
            torus,
            sphere_node,
            fountain,
        }
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("cairn demo")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) else {
            event_loop.exit();
            return;
        };
        let window = Arc::new(window);
        let (width, height) = window.inner_size().into();

        match Engine::new_blocking(window.clone(), width, height) {
            Ok(mut engine) => {
                self.scene = Some(DemoApp::build_scene(&mut engine));
                self.engine = Some(engine);
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("engine init failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(engine), Some(scene)) = (self.engine.as_mut(), self.scene.as_ref()) else {
            return;
        };
        engine.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => engine.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: winit::event::ElementState::Pressed,
                button: winit::event::MouseButton::Left,
                ..
            } => {
                let (x, y) = engine.input().mouse_position();
                let hit = engine.raycast_screen(x, y);
                if hit.hit {
                    log::info!("picked mesh {} at distance {:.2}", hit.mesh, hit.distance);
                }
            }
            WindowEvent::RedrawRequested => {
                if engine.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                if engine.key_pressed(KeyCode::Space) {
                    engine.emitter_burst(scene.fountain, 200);
                }

                engine.update();
                self.angle += engine.delta() * 45.0;
                engine.node_set_rotation(
                    scene.parent_node,
                    Vector3::new(0.0, self.angle, 0.0),
                );
                engine.node_set_rotation(
                    scene.child_node,
                    Vector3::new(self.angle * 2.0, 0.0, 0.0),
                );

                engine.begin_frame([0.05, 0.05, 0.08, 1.0]);
                engine.draw_node(scene.parent_node);
                engine.draw_node(scene.child_node);
                engine.draw_node(scene.sphere_node);
                engine.draw_mesh(
                    scene.ground,
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(1.0, 1.0, 1.0),
                );
                engine.draw_mesh(
                    scene.torus,
                    Vector3::new(0.0, 2.5, -4.0),
                    Vector3::new(90.0, self.angle * 0.5, 0.0),
                    Vector3::new(1.0, 1.0, 1.0),
                );
                engine.end_frame();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        if let Some(engine) = self.engine.as_mut() {
            engine.handle_device_event(&event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = DemoApp::default();
    event_loop.run_app(&mut app)?;
    Ok(())
}
