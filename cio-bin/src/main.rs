use anyhow::{anyhow, bail, Context, Result};
use cio::format::tag_of;
use cio::{ReadClose, WriteClose};
use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn short_opt<I: Iterator<Item = OsString>>(opt: char, arg: &str, argv: &mut I) -> Option<OsString> {
    let mut chars = arg.chars();
    if chars.next() != Some('-') || chars.next() != Some(opt) {
        return None;
    }

    let rest = chars.as_str();
    if rest.is_empty() {
        return argv.next();
    }

    Some(rest.into())
}

enum IFile {
    File(PathBuf),
    Stdin,
}

enum OFile {
    File(PathBuf),
    Stdout,
}

struct Options {
    ifile: IFile,
    ofile: OFile,
    itag: Option<String>,
    otag: Option<String>,
    level: u32,
    verbose: bool,
}

impl Options {
    fn input_tag(&self) -> String {
        match (&self.itag, &self.ifile) {
            (Some(tag), _) => tag.clone(),
            (None, IFile::File(path)) => tag_of(path).to_owned(),
            (None, IFile::Stdin) => String::new(),
        }
    }

    fn output_tag(&self) -> String {
        match (&self.otag, &self.ofile) {
            (Some(tag), _) => tag.clone(),
            (None, OFile::File(path)) => tag_of(path).to_owned(),
            (None, OFile::Stdout) => String::new(),
        }
    }

    fn open_input(&self) -> Result<Box<dyn ReadClose>> {
        let tag = self.input_tag();
        let r = match &self.ifile {
            IFile::File(path) => cio::decompressing_reader(File::open(path), &tag)
                .with_context(|| format!("Cannot read {}", path.display()))?,
            IFile::Stdin => cio::decompressing_reader(Ok(io::stdin()), &tag)?,
        };
        Ok(r)
    }

    fn open_output(&self, tag: &str) -> Result<Box<dyn WriteClose>> {
        let w = match &self.ofile {
            OFile::File(path) => {
                cio::compressing_writer_with_level(File::create(path), tag, self.level)
                    .with_context(|| format!("Cannot write {}", path.display()))?
            }
            OFile::Stdout => cio::compressing_writer_with_level(Ok(io::stdout()), tag, self.level)?,
        };
        Ok(w)
    }
}

fn parse_level(val: &OsString) -> Result<u32> {
    let level = val
        .to_str()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| anyhow!("Invalid level: {}", val.to_string_lossy()))?;
    if level > cio::compression::MAX_LEVEL {
        bail!("Level must be between 0 and {}", cio::compression::MAX_LEVEL);
    }

    Ok(level)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn cmd_cat(opts: &Options, args: &[OsString]) -> Result<()> {
    let mut ofile = opts.open_output(&opts.output_tag())?;

    if args.is_empty() {
        let mut r = opts.open_input()?;
        io::copy(&mut r, &mut ofile)?;
        r.close()?;
    }

    for arg in args {
        let path = PathBuf::from(arg);
        let tag = match &opts.itag {
            Some(tag) => tag.clone(),
            None => tag_of(&path).to_owned(),
        };

        debug!(path = %path.display(), format = %tag, "cat");
        let mut r = cio::decompressing_reader(File::open(&path), &tag)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        io::copy(&mut r, &mut ofile)
            .with_context(|| format!("Cannot decompress {}", path.display()))?;
        r.close()?;
    }

    ofile.close()?;
    Ok(())
}

fn cmd_convert(opts: &Options) -> Result<()> {
    let mut ifile = opts.open_input()?;
    let mut ofile = opts.open_output(&opts.output_tag())?;

    let n = io::copy(&mut ifile, &mut ofile)?;
    debug!(bytes = n, "converted");

    ifile.close()?;
    ofile.close()?;
    Ok(())
}

fn usage(argv0: &str) {
    println!("Usage:");
    println!("  {} [options] cat [paths...]", argv0);
    println!("  {} [options] convert", argv0);
    println!("Options:");
    println!("  -i<path>: Input file (default: stdin)");
    println!("  -o<path>: Output file (default: stdout)");
    println!("  -f<tag>: Input format, e.g. '.gz' (default: input file extension)");
    println!("  -F<tag>: Output format (default: output file extension)");
    println!("  -l<level>: gzip level, 0-9 (default: {})", cio::DEFAULT_LEVEL);
    println!("  -v: Verbose logging");
}

fn parse_args<I: Iterator<Item = OsString>>(mut argv: I) -> Result<(Options, Vec<OsString>)> {
    let mut opts = Options {
        ifile: IFile::Stdin,
        ofile: OFile::Stdout,
        itag: None,
        otag: None,
        level: cio::DEFAULT_LEVEL,
        verbose: false,
    };
    let mut args = Vec::<OsString>::new();

    while let Some(arg_os) = argv.next() {
        let arg = match arg_os.to_str() {
            Some(arg) if arg.starts_with('-') && arg.len() > 1 => Some(arg.to_owned()),
            _ => None,
        };
        let arg = match arg {
            Some(arg) => arg,
            None => {
                args.push(arg_os);
                continue;
            }
        };

        if arg == "-v" {
            opts.verbose = true;
        } else if let Some(val) = short_opt('i', &arg, &mut argv) {
            opts.ifile = if val == "-" {
                IFile::Stdin
            } else {
                IFile::File(val.into())
            };
        } else if let Some(val) = short_opt('o', &arg, &mut argv) {
            opts.ofile = if val == "-" {
                OFile::Stdout
            } else {
                OFile::File(val.into())
            };
        } else if let Some(val) = short_opt('f', &arg, &mut argv) {
            opts.itag = Some(val.to_string_lossy().into_owned());
        } else if let Some(val) = short_opt('F', &arg, &mut argv) {
            opts.otag = Some(val.to_string_lossy().into_owned());
        } else if let Some(val) = short_opt('l', &arg, &mut argv) {
            opts.level = parse_level(&val)?;
        } else {
            bail!("Invalid option: {}", arg);
        }
    }

    Ok((opts, args))
}

fn main() -> Result<()> {
    let mut argv = env::args_os();
    let argv0 = argv
        .next()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cio".into());

    let (opts, args) = parse_args(argv)?;
    init_logging(opts.verbose);

    if args.is_empty() {
        usage(&argv0);
        process::exit(1);
    }

    let subcmd = args[0].to_str();
    let args = &args[1..];
    match subcmd {
        Some("cat") => cmd_cat(&opts, args),
        Some("convert") => {
            if !args.is_empty() {
                bail!("'convert' expects no further arguments");
            }

            cmd_convert(&opts)
        }
        _ => Err(anyhow!(
            "Unknown subcommand: {}",
            subcmd.unwrap_or("<non-utf8>")
        )),
    }
}

#[cfg(test)]
fn os_args(args: &[&str]) -> std::vec::IntoIter<OsString> {
    args.iter()
        .map(OsString::from)
        .collect::<Vec<_>>()
        .into_iter()
}

#[test]
fn test_short_opt() {
    let mut rest = os_args(&["next"]);
    assert_eq!(short_opt('i', "-ifoo.gz", &mut rest), Some("foo.gz".into()));
    assert_eq!(short_opt('i', "-i", &mut rest), Some("next".into()));
    assert_eq!(short_opt('i', "-i", &mut rest), None);
    assert_eq!(short_opt('o', "-ifoo", &mut rest), None);
    assert_eq!(short_opt('i', "i", &mut rest), None);
}

#[test]
fn test_parse_args() {
    let (opts, args) =
        parse_args(os_args(&["-i", "in.bz2", "-oout.gz", "-l", "9", "-v", "convert"])).unwrap();
    assert_eq!(opts.input_tag(), ".bz2");
    assert_eq!(opts.output_tag(), ".gz");
    assert_eq!(opts.level, 9);
    assert!(opts.verbose);
    assert_eq!(args, vec![OsString::from("convert")]);

    let (opts, _) = parse_args(os_args(&["-f.gz", "-F", "", "cat"])).unwrap();
    assert_eq!(opts.input_tag(), ".gz");
    assert_eq!(opts.output_tag(), "");
}

#[test]
fn test_parse_args_errors() {
    assert!(parse_args(os_args(&["-x"])).is_err());
    assert!(parse_args(os_args(&["-l", "10"])).is_err());
    assert!(parse_args(os_args(&["-lfast"])).is_err());
}

#[test]
fn test_stdio_tags_default_to_plain() {
    let (opts, _) = parse_args(os_args(&["cat"])).unwrap();
    assert_eq!(opts.input_tag(), "");
    assert_eq!(opts.output_tag(), "");
}
