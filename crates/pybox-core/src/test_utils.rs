//! Shared helpers for tests that exercise subprocess behavior without a
//! real Python toolchain on the host.

use crate::config::SandboxConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Stand-in for a host Python: `-m venv <path>` builds a fake environment
/// whose `python` executes the submitted script with /bin/sh (so tests
/// submit shell snippets as "code") and whose `pip` rejects packages with
/// "bad" in the name and stalls on packages with "slow" in the name.
pub const FAKE_INTERPRETER: &str = r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
    mkdir -p "$3/bin"
    cat > "$3/bin/python" <<'PYEOF'
#!/bin/sh
exec /bin/sh "$1"
PYEOF
    cat > "$3/bin/pip" <<'PIPEOF'
#!/bin/sh
shift
for pkg in "$@"; do
    case "$pkg" in
        *bad*) echo "No matching distribution found for $pkg" >&2; exit 1 ;;
        *slow*) sleep 30 ;;
    esac
done
exit 0
PIPEOF
    chmod +x "$3/bin/python" "$3/bin/pip"
    exit 0
fi
echo "unexpected invocation: $*" >&2
exit 1
"#;

pub fn create_fake_executable(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }
}

pub fn fake_interpreter(dir: &Path) -> PathBuf {
    let path = dir.join("bin").join("python3");
    create_fake_executable(&path, FAKE_INTERPRETER);
    path
}

/// Config pointing at a store under `dir`, with the fake interpreter and
/// short timeouts so timeout tests finish quickly.
pub fn test_config(dir: &Path) -> SandboxConfig {
    SandboxConfig {
        store_base: dir.join("store"),
        execution_timeout_secs: 1,
        install_timeout_secs: 1,
        interpreter: Some(fake_interpreter(dir)),
        ..SandboxConfig::default()
    }
}
