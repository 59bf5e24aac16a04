//! An input thread drawing and clearing while a render thread stages frames,
//! all on host memory.

use arbrush::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn host_stager(config: &StrokeConfig) -> FrameStager<HostStorage, HostStorage, HostStorage> {
    FrameStager::new(
        HostStorage::new(config.vertex_capacity() * VERTEX_SIZE),
        HostStorage::new(config.index_capacity() * VERTEX_INDEX_SIZE),
        UniformRingBuffer::in_host_memory(UniformRingConfig::default()).unwrap(),
    )
}

fn spiral(i: usize) -> Vec3 {
    let t = i as f32 * 0.1;
    Vec3::new(t.cos(), t.sin(), t * 0.05)
}

#[test]
fn staged_frames_are_always_consistent() {
    init_logger();
    let config = StrokeConfig::new().with_max_points(300);
    let mesh = SharedStrokeMesh::new(config).unwrap();
    let mut stager = host_stager(&config);
    let done = Arc::new(AtomicBool::new(false));

    let input = {
        let mesh = mesh.clone();
        let done = done.clone();
        thread::spawn(move || {
            for round in 0..4 {
                for i in 0..400 {
                    let split = i % 50 == 0;
                    let mode = if round % 2 == 0 {
                        ColorMode::Rainbow
                    } else {
                        ColorMode::Normal
                    };
                    mesh.add_point(spiral(i), 0.02, mode, split);
                }
                mesh.clear();
                mesh.clear();
            }
            for i in 0..100 {
                mesh.add_point(spiral(i), 0.02, ColorMode::default(), false);
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let completion = stager.completion();
    let mut frames = 0;
    loop {
        let finished = done.load(Ordering::SeqCst);

        if let Some(frame) = stager
            .prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap()
        {
            let snapshot = *frame.snapshot();
            assert_eq!(snapshot.index_count % 6, 0);
            assert!(snapshot.vertex_count <= config.vertex_capacity());
            assert!(snapshot.index_count <= config.index_capacity());

            let indices = stager
                .index_storage()
                .read::<VertexIndex>(snapshot.index_count);
            assert!(indices
                .iter()
                .all(|&i| (i as usize) < snapshot.vertex_count));

            frames += 1;
            completion.signal();
        }

        if finished {
            break;
        }
    }

    input.join().unwrap();

    let last = stager
        .prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY)
        .unwrap()
        .expect("the final stroke is drawable");
    let expected = mesh.snapshot();
    assert_eq!(*last.snapshot(), expected);
    assert_eq!(
        stager.vertex_storage().read::<Vertex>(expected.vertex_count),
        mesh.lock().vertices()
    );
    assert!(frames > 0);
}

#[test]
fn render_thread_waits_for_gpu_completion() {
    init_logger();
    let config = StrokeConfig::new().with_max_points(16);
    let mesh = SharedStrokeMesh::new(config).unwrap();
    mesh.add_point(Vec3::ZERO, 0.1, ColorMode::Normal, false);
    mesh.add_point(Vec3::X, 0.1, ColorMode::Normal, false);

    let mut stager = host_stager(&config);
    let completion = stager.completion();

    for _ in 0..3 {
        assert!(stager
            .prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap()
            .is_some());
    }
    assert_eq!(completion.in_flight(), 3);

    let gpu = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        completion.signal();
        completion
    });

    // Blocks until the simulated GPU retires the oldest frame.
    let frame = stager
        .prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY)
        .unwrap()
        .unwrap();
    assert_eq!(frame.slot().index(), 0);

    let completion = gpu.join().unwrap();
    assert_eq!(completion.in_flight(), 3);
}

#[test]
fn teardown_unblocks_render_thread() {
    init_logger();
    let config = StrokeConfig::new().with_max_points(16);
    let mesh = SharedStrokeMesh::new(config).unwrap();
    mesh.add_point(Vec3::ZERO, 0.1, ColorMode::Normal, false);
    mesh.add_point(Vec3::Y, 0.1, ColorMode::Normal, false);

    let mut stager = host_stager(&config);
    let completion = stager.completion();

    let render = thread::spawn(move || loop {
        match stager.prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY) {
            Ok(_) => continue,
            Err(err) => return err,
        }
    });

    thread::sleep(Duration::from_millis(30));
    completion.close();

    assert_eq!(render.join().unwrap(), FrameError::GateClosed(GateClosed));
}

#[test]
fn brush_feeds_the_render_thread() {
    init_logger();
    let config = StrokeConfig::new().with_max_points(500);
    let mesh = SharedStrokeMesh::new(config).unwrap();
    let mut stager = host_stager(&config);
    let completion = stager.completion();
    let mut brush = BrushController::default();

    brush.press();
    for i in 0..60 {
        brush.update(
            &mesh,
            PointerSample {
                position: spiral(i) * 0.1,
                camera: Mat4::IDENTITY,
                valid: true,
            },
        );
        if i == 30 {
            brush.release();
            brush.press();
        }
        if let Some(frame) = stager
            .prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap()
        {
            assert!(frame.index_count() > 0);
            completion.signal();
        }
    }

    let snapshot = mesh.snapshot();
    assert!(snapshot.point_count > 50);
    assert_eq!(stager.uploader().uploaded_indices(), snapshot.index_count);
}
