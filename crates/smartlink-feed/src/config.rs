use anyhow::Result;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub data_dir: PathBuf,
    pub socket: String,
    pub watch: bool,
}

pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        format!("{dir}/smartlink.sock")
    } else {
        "/tmp/smartlink.sock".to_string()
    }
}

pub fn parse_args() -> Result<FeedConfig> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<FeedConfig>
where
    I: IntoIterator<Item = OsString>,
{
    let mut data_dir = PathBuf::from(".");
    let mut socket = None;
    let mut watch = true;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--data" {
            let Some(path) = args.next() else {
                anyhow::bail!("--data expects a directory");
            };
            data_dir = PathBuf::from(path);
        } else if arg == "--socket" {
            let Some(path) = args.next() else {
                anyhow::bail!("--socket expects a path");
            };
            socket = Some(path.to_string_lossy().into_owned());
        } else if arg == "--no-watch" {
            watch = false;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    Ok(FeedConfig {
        data_dir,
        socket: socket.unwrap_or_else(default_socket_path),
        watch,
    })
}
