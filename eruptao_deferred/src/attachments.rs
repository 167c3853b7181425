use anyhow::{bail, ensure};
use erupt::vk;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttachmentRole {
    PositionDepth,
    Normal,
    Occlusion,
}

/// An image view created and owned by someone else, described well enough
/// for the pass to bind it.
#[derive(Copy, Clone, Debug)]
pub struct ImageAttachment<V> {
    pub role:   AttachmentRole,
    pub view:   V,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

/// The G-buffer inputs and the occlusion output of the SSAO pass.
#[derive(Copy, Clone, Debug)]
pub struct SsaoAttachments<V> {
    pub position_depth: ImageAttachment<V>,
    pub normal:         ImageAttachment<V>,
    pub occlusion:      ImageAttachment<V>,
}

impl<V> SsaoAttachments<V> {
    pub fn extent(&self) -> vk::Extent2D {
        self.occlusion.extent
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let expected = [
            (&self.position_depth, AttachmentRole::PositionDepth),
            (&self.normal, AttachmentRole::Normal),
            (&self.occlusion, AttachmentRole::Occlusion),
        ];
        for (attachment, role) in expected {
            if attachment.role != role {
                bail!("{role:?} slot holds a {:?} attachment", attachment.role);
            }
            ensure!(
                attachment.extent.width > 0 && attachment.extent.height > 0,
                "{role:?} attachment has an empty extent"
            );
            ensure!(attachment.format != vk::Format::UNDEFINED, "{role:?} attachment has no format");
        }

        let output = self.occlusion.extent;
        for input in [&self.position_depth, &self.normal] {
            ensure!(
                input.extent.width == output.width && input.extent.height == output.height,
                "{:?} attachment is {}x{} but the occlusion target is {}x{}",
                input.role,
                input.extent.width,
                input.extent.height,
                output.width,
                output.height
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(role: AttachmentRole, width: u32, height: u32) -> ImageAttachment<u32> {
        ImageAttachment { role, view: 1, format: vk::Format::R16G16B16A16_SFLOAT, extent: vk::Extent2D { width, height } }
    }

    fn attachments() -> SsaoAttachments<u32> {
        SsaoAttachments {
            position_depth: attachment(AttachmentRole::PositionDepth, 800, 600),
            normal:         attachment(AttachmentRole::Normal, 800, 600),
            occlusion:      attachment(AttachmentRole::Occlusion, 800, 600),
        }
    }

    #[test]
    fn matching_attachments_are_valid() {
        assert!(attachments().validate().is_ok());
    }

    #[test]
    fn swapped_roles_are_rejected() {
        let mut attachments = attachments();
        std::mem::swap(&mut attachments.position_depth, &mut attachments.normal);
        assert!(attachments.validate().is_err());
    }

    #[test]
    fn zero_extent_is_rejected() {
        let mut attachments = attachments();
        attachments.occlusion.extent.height = 0;
        assert!(attachments.validate().is_err());
    }

    #[test]
    fn mismatched_extents_are_rejected() {
        let mut attachments = attachments();
        attachments.normal = attachment(AttachmentRole::Normal, 400, 300);
        let error = attachments.validate().unwrap_err();
        assert!(error.to_string().contains("400x300"));
    }
}
