use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ONC RPC protocol version carried in every call header
pub const RPC_VERSION: u32 = 2;

// Port mapper (rpcbind v2)
pub const PMAP_PROGRAM: u32 = 100000;
pub const PMAP_VERSION: u32 = 2;
pub const PMAP_PORT: u16 = 111;
pub const PMAPPROC_NULL: u32 = 0;
pub const PMAPPROC_GETPORT: u32 = 3;

// IP protocol numbers understood by the port mapper
pub const IPPROTO_TCP: u32 = 6;
pub const IPPROTO_UDP: u32 = 17;

// MOUNT v3
pub const MOUNT_PROGRAM: u32 = 100005;
pub const MOUNT_V3: u32 = 3;
pub const MOUNTPROC3_NULL: u32 = 0;
pub const MOUNTPROC3_MNT: u32 = 1;
pub const MOUNTPROC3_UMNT: u32 = 3;
// Longest export path and NFSv3 file handle
pub const MNTPATHLEN: usize = 1024;
pub const FHSIZE3: usize = 64;

// NFS
pub const NFS_PROGRAM: u32 = 100003;
pub const NFS_V3: u32 = 3;
pub const NFS_V4: u32 = 4;
pub const NFS_PORT: u16 = 2049;
// NFSv3 procedure names, indexed by procedure number
pub const NFSPROC3_NAMES: [&str; 22] = [
    "NULL", "GETATTR", "SETATTR", "LOOKUP", "ACCESS", "READLINK", "READ", "WRITE", "CREATE", "MKDIR",
    "SYMLINK", "MKNOD", "REMOVE", "RMDIR", "RENAME", "LINK", "READDIR", "READDIRPLUS", "FSSTAT",
    "FSINFO", "PATHCONF", "COMMIT",
];
pub const NFSPROC4_NULL: u32 = 0;
pub const NFSPROC4_COMPOUND: u32 = 1;

// Maximum sizes from the RPC and NFS protocol definitions
pub const MAX_AUTH_BYTES: usize = 400;
pub const MAX_MACHINE_NAME: usize = 255;
pub const MAX_AUTH_SYS_GIDS: usize = 16;
pub const NFS4_FHSIZE: usize = 128;
pub const NFS4_OTHER_SIZE: usize = 12;
pub const NFS4_VERIFIER_SIZE: usize = 8;

// Record marking: high bit flags the last fragment of a record
pub const LAST_FRAGMENT: u32 = 0x8000_0000;
pub const FRAGMENT_LENGTH_MASK: u32 = 0x7fff_ffff;
// Refuse to reassemble records larger than this
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

// Default time a caller waits for its reply
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
// Time allowed to open a TCP connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
// Maximum calls in flight on a single channel
pub const MAX_PENDING_CALLS: usize = 1024;

// Session replay cache
pub const DEFAULT_SLOT_COUNT: usize = 8;
// Tag prefix of replies served from the replay cache
pub const REPLAY_TAG_PREFIX: &str = "[REPLAY] ";
// COMPOUND4res status + resarray length
pub const COMPOUND_RES_BASE_SIZE: usize = 8;
