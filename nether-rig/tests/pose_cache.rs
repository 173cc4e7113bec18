//! End-to-end tests: rig construction, per-frame animation writes and palette reads

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use nether_rig::{BoneDesc, BoneMatrix3x4, Pose, RigDesc, Skeleton, Transform};

const EPS: f32 = 1e-4;

/// Small biped: pelvis with a spine/head chain and two legs
fn biped() -> Arc<Skeleton> {
    let bones = [
        ("pelvis", None, Vec3::new(0.0, 1.0, 0.0)),
        ("spine", Some(0), Vec3::new(0.0, 0.3, 0.0)),
        ("head", Some(1), Vec3::new(0.0, 0.5, 0.0)),
        ("thigh_l", Some(0), Vec3::new(0.2, -0.1, 0.0)),
        ("shin_l", Some(3), Vec3::new(0.0, -0.45, 0.0)),
        ("thigh_r", Some(0), Vec3::new(-0.2, -0.1, 0.0)),
        ("shin_r", Some(5), Vec3::new(0.0, -0.45, 0.0)),
    ];
    let desc = RigDesc {
        bones: bones
            .iter()
            .map(|&(name, parent, offset)| BoneDesc {
                name: name.to_string(),
                parent,
                rest: Transform::from_translation(offset),
                length: offset.length(),
            })
            .collect(),
    };
    Arc::new(Skeleton::from_desc(&desc).unwrap())
}

fn walk_frame(pose: &mut Pose, skeleton: &Skeleton, t: f32) {
    for (name, phase) in [("thigh_l", 0.0), ("thigh_r", 0.5)] {
        let index = skeleton.bone_by_name(name).unwrap().index();
        let rest = skeleton.bind_pose().relative_transform(index);
        let swing = Quat::from_rotation_x(((t + phase) * TAU).sin() * 0.6);
        pose.set_relative_transform(
            index,
            Transform {
                rotation: swing,
                ..rest
            },
        );
    }
}

#[test]
fn animated_pose_skins_vertices_like_bone_chain() {
    let skeleton = biped();
    let mut pose = Pose::new(Arc::clone(&skeleton)).unwrap();
    let shin = skeleton.bone_by_name("shin_l").unwrap().index();

    // A vertex at the knee in bind space
    let bind_knee = skeleton.bind_pose().absolute_transform(shin).translation;

    for frame in 0..8 {
        walk_frame(&mut pose, &skeleton, frame as f32 / 8.0);
        let palette = pose.skinning_matrices().to_vec();

        let skinned = palette[shin].transform_point3(bind_knee);
        let expected = pose.absolute_transform(shin).translation;
        assert!(
            skinned.abs_diff_eq(expected, EPS),
            "frame {frame}: {skinned} != {expected}"
        );
    }
}

#[test]
fn untouched_limbs_stay_at_identity() {
    let skeleton = biped();
    let mut pose = Pose::new(Arc::clone(&skeleton)).unwrap();
    walk_frame(&mut pose, &skeleton, 0.3);

    let palette = pose.skinning_matrices();
    for name in ["pelvis", "spine", "head"] {
        let index = skeleton.bone_by_name(name).unwrap().index();
        assert!(palette[index].abs_diff_eq(Mat4::IDENTITY, EPS), "{name}");
    }
}

#[test]
fn poses_share_one_skeleton_across_threads() {
    let skeleton = biped();

    let palettes: Vec<Vec<BoneMatrix3x4>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let skeleton = Arc::clone(&skeleton);
                scope.spawn(move || {
                    let mut pose = Pose::new(Arc::clone(&skeleton)).unwrap();
                    walk_frame(&mut pose, &skeleton, i as f32 * 0.25);
                    let mut gpu = Vec::new();
                    pose.write_gpu_palette(&mut gpu);
                    gpu
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Same phase on a fresh pose on this thread gives the same palette
    let mut pose = Pose::new(Arc::clone(&skeleton)).unwrap();
    walk_frame(&mut pose, &skeleton, 0.5);
    let mut local = Vec::new();
    pose.write_gpu_palette(&mut local);

    assert_eq!(palettes.len(), 4);
    for (a, b) in palettes[2].iter().zip(&local) {
        assert!(a.to_mat4().abs_diff_eq(b.to_mat4(), EPS));
    }
    let bytes: &[u8] = bytemuck::cast_slice(&local);
    assert_eq!(bytes.len(), skeleton.bone_count() * nether_rig::BONE_MATRIX_SIZE);
}

#[test]
fn copying_pose_between_instances() {
    let skeleton = biped();
    let mut leader = Pose::new(Arc::clone(&skeleton)).unwrap();
    let mut follower = Pose::new(Arc::clone(&skeleton)).unwrap();

    walk_frame(&mut leader, &skeleton, 0.75);
    follower.copy_from(&leader).unwrap();

    let a = leader.skinning_matrices().to_vec();
    let b = follower.skinning_matrices().to_vec();
    assert_eq!(a, b);

    follower.reset();
    for matrix in follower.skinning_matrices() {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, EPS));
    }
}
