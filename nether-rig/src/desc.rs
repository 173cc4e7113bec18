//! Serializable rig descriptions
//!
//! A [`RigDesc`] is a flat, parent-indexed list of bones that asset tools and
//! manifests use to hand a rig to [`Skeleton::from_desc`]. Parents must come
//! before their children and only the first bone may be parentless, which
//! keeps bone indices identical between the description and the skeleton.
//!
//! ```toml
//! [[bones]]
//! name = "root"
//!
//! [[bones]]
//! name = "spine"
//! parent = 0
//! length = 0.5
//! rest = { translation = [0.0, 1.0, 0.0] }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::skeleton::Skeleton;
use crate::transform::Transform;
use crate::{BoneIndex, MAX_BONES};

/// Flat description of a rig
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RigDesc {
    pub bones: Vec<BoneDesc>,
}

/// One bone of a [`RigDesc`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneDesc {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<BoneIndex>,
    #[serde(default)]
    pub rest: Transform,
    #[serde(default)]
    pub length: f32,
}

impl RigDesc {
    /// Check ordering and root rules without building anything.
    pub fn validate(&self) -> Result<(), RigError> {
        if self.bones.is_empty() {
            return Err(RigError::EmptyRig);
        }
        if self.bones.len() > MAX_BONES {
            return Err(RigError::TooManyBones(MAX_BONES));
        }
        for (index, bone) in self.bones.iter().enumerate() {
            match (index, bone.parent) {
                (0, None) => {}
                (0, Some(parent)) => return Err(RigError::InvalidParent { index, parent }),
                (_, None) => return Err(RigError::MultipleRoots(index)),
                (_, Some(parent)) if parent >= index => {
                    return Err(RigError::InvalidParent { index, parent });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Skeleton {
    /// Build a skeleton from a description and calculate its bind pose.
    pub fn from_desc(desc: &RigDesc) -> Result<Self, RigError> {
        desc.validate()?;

        let mut skeleton = Skeleton::new();
        for bone in &desc.bones {
            let index = match bone.parent {
                Some(parent) => skeleton.create_child(parent)?,
                None => skeleton.create_bone()?,
            };
            skeleton.rename_bone(index, &bone.name)?;
            skeleton.set_rest_transform(index, bone.rest)?;
            skeleton.set_bone_length(index, bone.length)?;
        }
        skeleton.calculate_bind_pose();

        tracing::debug!(bones = skeleton.bone_count(), "Built skeleton from rig description");
        Ok(skeleton)
    }

    /// Describe this skeleton's bones, names and rest transforms.
    pub fn to_desc(&self) -> RigDesc {
        RigDesc {
            bones: self
                .bones()
                .iter()
                .map(|bone| BoneDesc {
                    name: bone.name().to_string(),
                    parent: bone.parent(),
                    rest: *bone.rest_transform(),
                    length: bone.length(),
                })
                .collect(),
        }
    }
}
