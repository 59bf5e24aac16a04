//! Rendering on a real adapter. Skipped when the machine has none.

use arbrush::prelude::*;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const SIZE: u32 = 64;
const FRAMES: usize = 5;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn headless_context() -> Option<Context> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("arbrush_test_device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::Off,
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
    }))
    .ok()?;

    Some(Context::new(device, queue))
}

fn target(ctxt: &Context, format: wgpu::TextureFormat, label: &str) -> wgpu::Texture {
    ctxt.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

#[test]
fn single_slot_renderer_keeps_rendering() {
    init_logger();
    let Some(ctxt) = headless_context() else {
        eprintln!("No wgpu adapter available, skipping.");
        return;
    };

    let config = StrokeConfig::new().with_max_points(64);
    let mesh = SharedStrokeMesh::new(config).unwrap();
    for x in [-0.5, 0.0, 0.5] {
        mesh.add_point(
            Vec3::new(x, 0.0, 0.0),
            0.1,
            ColorMode::Solid(WHITE),
            false,
        );
    }

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let color_format = wgpu::TextureFormat::Rgba8Unorm;
        let color = target(&ctxt, color_format, "stroke_test_color");
        let depth = target(&ctxt, Context::depth_format(), "stroke_test_depth");
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let pipeline =
            StrokePipeline::builtin(&ctxt, color_format, Some(Context::depth_format()));
        let mut renderer = StrokeRenderer::with_ring_config(
            &ctxt,
            pipeline,
            config,
            UniformRingConfig::default().with_in_flight(1),
        )
        .unwrap();

        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 0.1, 10.0);

        for _ in 0..FRAMES {
            let drawn = renderer
                .render(&mesh, view, proj, &color_view, Some(&depth_view), Some(BLACK))
                .unwrap();
            tx.send(drawn).unwrap();
        }

        let image = capture_texture(&ctxt, &color).unwrap();
        renderer.shutdown();
        image
    });

    // Each frame must come back well within the deadline: a render thread
    // that never sees its completion signal would hang here.
    for frame in 0..FRAMES {
        let drawn = rx
            .recv_timeout(Duration::from_secs(10))
            .unwrap_or_else(|_| panic!("frame {frame} never finished"));
        assert!(drawn);
    }

    let image = worker.join().unwrap();
    assert_eq!(image.dimensions(), (SIZE, SIZE));
    assert!(image.pixels().any(|p| p.0[..3] != [0, 0, 0]));
}
