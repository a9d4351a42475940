use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use rand::Rng;
use time::OffsetDateTime;

/// Extensions accepted for uploaded images, matched against the client's
/// original file name.
const ALLOWED_IMAGE_EXTS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Lowercased extension of `file_name` if it is an accepted image type.
pub fn image_ext(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    if ALLOWED_IMAGE_EXTS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Collision-resistant file name: `{field}-{unix_millis}-{random}.{ext}`.
pub fn unique_name(field: &str, ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{field}-{millis}-{suffix}.{ext}")
}

/// Write an uploaded image under `{upload_dir}/{subdir}` and return its public
/// path (`/uploads/{subdir}/{name}`). Rejects anything that is not
/// jpg/jpeg/png/gif by original file name.
pub async fn save_image(
    upload_dir: &str,
    subdir: &str,
    field: &str,
    original_name: &str,
    data: Bytes,
) -> anyhow::Result<String> {
    let ext = image_ext(original_name)
        .ok_or_else(|| anyhow::anyhow!("Only image files are allowed!"))?;
    let name = unique_name(field, &ext);

    let dir: PathBuf = Path::new(upload_dir).join(subdir);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("create upload dir {}", dir.display()))?;
    let path = dir.join(&name);
    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("write upload {}", path.display()))?;

    Ok(format!("/uploads/{subdir}/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_image_extensions() {
        assert_eq!(image_ext("photo.jpg").as_deref(), Some("jpg"));
        assert_eq!(image_ext("photo.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(image_ext("a.b.png").as_deref(), Some("png"));
        assert_eq!(image_ext("anim.GIF").as_deref(), Some("gif"));
    }

    #[test]
    fn rejects_other_extensions() {
        assert_eq!(image_ext("script.exe"), None);
        assert_eq!(image_ext("doc.pdf"), None);
        assert_eq!(image_ext("noextension"), None);
        assert_eq!(image_ext("archive.tar.gz"), None);
    }

    #[test]
    fn unique_names_differ() {
        let a = unique_name("images", "jpg");
        let b = unique_name("images", "jpg");
        assert_ne!(a, b);
        assert!(a.starts_with("images-"));
        assert!(a.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn save_image_writes_file_and_returns_public_path() {
        let tmp = std::env::temp_dir().join(format!("sisterkadu-test-{}", uuid::Uuid::new_v4()));
        let dir = tmp.to_str().unwrap().to_string();

        let path = save_image(&dir, "projects", "images", "pic.png", Bytes::from_static(b"png"))
            .await
            .expect("save should succeed");
        assert!(path.starts_with("/uploads/projects/images-"));
        assert!(path.ends_with(".png"));

        let on_disk = Path::new(&dir).join("projects").join(
            path.rsplit('/').next().unwrap(),
        );
        assert!(on_disk.exists());
        tokio::fs::remove_dir_all(&tmp).await.ok();
    }

    #[tokio::test]
    async fn save_image_rejects_bad_extension() {
        let err = save_image("/tmp", "projects", "images", "evil.sh", Bytes::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Only image files"));
    }
}
