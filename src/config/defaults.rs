//! Default configuration values

/// Name of the build environment pipeline
pub const BUILD_PIPELINE: &str = "build";

/// Name of the ostree deployment pipeline
pub const DEPLOYMENT_PIPELINE: &str = "ostree-deployment";

/// Name of the raw disk image pipeline
pub const RAW_IMAGE_PIPELINE: &str = "image";

/// Name of the qcow2 conversion pipeline
pub const QCOW2_PIPELINE: &str = "qcow2";

/// Name of the xz compression pipeline
pub const XZ_PIPELINE: &str = "xz";

/// Default output filename of the raw disk image
pub const RAW_IMAGE_FILENAME: &str = "disk.img";

/// Default output filename of the qcow2 image
pub const QCOW2_FILENAME: &str = "image.qcow2";

/// Default output filename of the xz archive
pub const XZ_FILENAME: &str = "image.xz";

/// Repository path inside the deployed tree
pub const OSTREE_REPO_PATH: &str = "/ostree/repo";

/// Filesystem label of the deployed root
pub const ROOTFS_LABEL: &str = "root";

/// Runner used when neither the request nor the global config names one
pub const DEFAULT_RUNNER: &str = "linux";

/// Manifest format version written by `compile`
pub const MANIFEST_VERSION: &str = "2";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
