use std::collections::HashMap;
use std::default;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io::{Error, ErrorKind, Result, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, trace};
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};

use crate::code_generator::CodeGenerator;
use crate::extern_paths::ExternPaths;
use crate::message_graph::MessageGraph;
use crate::path::PathMap;
use crate::Module;

/// Configuration options for `.proto` -> Rust code generation.
///
/// This configuration builder can be used to set non-default code generation options.
pub struct Config {
    pub(crate) file_descriptor_set_path: Option<PathBuf>,
    pub(crate) type_attributes: PathMap<String>,
    pub(crate) message_attributes: PathMap<String>,
    pub(crate) enum_attributes: PathMap<String>,
    pub(crate) field_attributes: PathMap<String>,
    pub(crate) boxed: PathMap<()>,
    pub(crate) well_known_types: bool,
    pub(crate) strip_enum_prefix: bool,
    pub(crate) out_dir: Option<PathBuf>,
    pub(crate) extern_paths: Vec<(String, String)>,
    pub(crate) default_package_filename: String,
    pub(crate) protoc_args: Vec<OsString>,
    pub(crate) protoc_executable: PathBuf,
    pub(crate) disable_comments: PathMap<()>,
    pub(crate) skip_debug: PathMap<()>,
    pub(crate) skip_protoc_run: bool,
    pub(crate) skip_source_info: bool,
    pub(crate) include_file: Option<PathBuf>,
    #[cfg(feature = "format")]
    pub(crate) fmt: bool,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Config {
        Config::default()
    }

    /// Adds an additional attribute to matching messages, enums, and one-ofs.
    ///
    /// The attribute is only added to the message, enum, or one-of, not to its fields.
    pub fn type_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.type_attributes
            .insert(path.as_ref().to_string(), attribute.as_ref().to_string());
        self
    }

    /// Adds an additional attribute to matching messages.
    pub fn message_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.message_attributes
            .insert(path.as_ref().to_string(), attribute.as_ref().to_string());
        self
    }

    /// Adds an additional attribute to matching enums.
    pub fn enum_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.enum_attributes
            .insert(path.as_ref().to_string(), attribute.as_ref().to_string());
        self
    }

    /// Adds an additional attribute to matching fields, including one-of variant fields.
    pub fn field_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.field_attributes
            .insert(path.as_ref().to_string(), attribute.as_ref().to_string());
        self
    }

    /// Boxes matching message and one-of variant fields.
    ///
    /// Recursively nested messages are boxed automatically to allow the generated struct to
    /// compile; this method exists for additionally boxing fields that would otherwise compile
    /// fine, typically to shrink the stack size of a large message's `Builder`.
    pub fn boxed<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<str>,
    {
        self.boxed.insert(path.as_ref().to_string(), ());
        self
    }

    /// Disables generation of doc comments from `.proto` comments for matching types or fields.
    pub fn disable_comments<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<str>,
    {
        self.disable_comments.insert(path.as_ref().to_string(), ());
        self
    }

    /// Suppresses the automatic `#[derive(Debug)]` for matching message and enum types, so the
    /// caller can supply a hand-written `Debug` impl via [`Config::type_attribute`].
    pub fn skip_debug<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<str>,
    {
        self.skip_debug.insert(path.as_ref().to_string(), ());
        self
    }

    /// Configures the code generator to not strip enum value name prefixes that repeat the
    /// enclosing enum's name (`Color::COLOR_RED` stays `Color::ColorRed` instead of becoming
    /// `Color::Red`).
    pub fn retain_enum_prefix(&mut self) -> &mut Self {
        self.strip_enum_prefix = false;
        self
    }

    /// Declares an externally provided Rust type to use instead of generating a message or enum
    /// for a given Protobuf type.
    ///
    /// **`proto_path`** must be fully qualified (begin with a leading `.`).
    pub fn extern_path<P1, P2>(&mut self, proto_path: P1, rust_path: P2) -> &mut Self
    where
        P1: AsRef<str>,
        P2: AsRef<str>,
    {
        self.extern_paths.push((
            proto_path.as_ref().to_string(),
            rust_path.as_ref().to_string(),
        ));
        self
    }

    /// Configures the code generator to not substitute `.google.protobuf` wrapper types
    /// (`Int32Value`, `StringValue`, `Empty`, ...) with their corresponding Rust types, instead
    /// requiring the well-known-types `.proto` sources to be compiled like any other message.
    pub fn compile_well_known_types(&mut self) -> &mut Self {
        self.well_known_types = false;
        self
    }

    /// Sets the output directory to write generated Rust files to.
    ///
    /// Defaults to the `OUT_DIR` environment variable when unset.
    pub fn out_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.out_dir = Some(path.into());
        self
    }

    /// Sets the path to write an include file containing `pub mod` declarations and
    /// `include!`s for every generated module, nested to match the Protobuf package hierarchy.
    pub fn include_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.include_file = Some(path.into());
        self
    }

    /// Sets the filename used for generated files whose Protobuf package is empty.
    pub fn default_package_filename(&mut self, filename: impl Into<String>) -> &mut Self {
        self.default_package_filename = filename.into();
        self
    }

    /// Sets the path to a file descriptor set to use in place of running `protoc`.
    pub fn file_descriptor_set_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.file_descriptor_set_path = Some(path.into());
        self
    }

    /// Skips running `protoc`, requiring [`Config::file_descriptor_set_path`] to be set.
    pub fn skip_protoc_run(&mut self) -> &mut Self {
        self.skip_protoc_run = true;
        self
    }

    /// Skips emitting the `--include_source_info` flag to `protoc`, which disables doc comment
    /// generation.
    pub fn skip_source_info(&mut self) -> &mut Self {
        self.skip_source_info = true;
        self
    }

    /// Sets the path to the `protoc` executable.
    ///
    /// Defaults to the `PROTOC` environment variable, falling back to `protoc` on `$PATH`.
    pub fn protoc_executable(&mut self, path: impl Into<OsString>) -> &mut Self {
        self.protoc_executable = path.into().into();
        self
    }

    /// Adds an additional argument to pass to `protoc`.
    pub fn protoc_arg<S>(&mut self, arg: S) -> &mut Self
    where
        S: AsRef<OsStr>,
    {
        self.protoc_args.push(arg.as_ref().to_owned());
        self
    }

    /// Configures whether to run the generated code through `prettyplease` before writing it.
    #[cfg(feature = "format")]
    pub fn format(&mut self, enabled: bool) -> &mut Self {
        self.fmt = enabled;
        self
    }

    /// Loads a [`FileDescriptorSet`], either from [`Config::file_descriptor_set_path`] or by
    /// invoking `protoc` against `protos`/`includes`.
    pub fn load_fds(
        &mut self,
        protos: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
    ) -> Result<FileDescriptorSet> {
        let tmp;
        let file_descriptor_set_path = if let Some(path) = &self.file_descriptor_set_path {
            path.clone()
        } else {
            if self.skip_protoc_run {
                return Err(Error::new(
                    ErrorKind::Other,
                    "file_descriptor_set_path is required with skip_protoc_run",
                ));
            }
            tmp = tempfile::Builder::new().prefix("protolith-compiler").tempdir()?;
            tmp.path().join("protolith-descriptor-set")
        };

        if !self.skip_protoc_run {
            let mut cmd = Command::new(&self.protoc_executable);
            cmd.arg("--include_imports");
            if !self.skip_source_info {
                cmd.arg("--include_source_info");
            }
            cmd.arg("-o").arg(&file_descriptor_set_path);

            for include in includes {
                if include.as_ref().exists() {
                    cmd.arg("-I").arg(include.as_ref());
                } else {
                    debug!(
                        "ignoring {} since it does not exist.",
                        include.as_ref().display()
                    )
                }
            }

            if let Some(protoc_include) = protoc_include_from_env() {
                cmd.arg("-I").arg(protoc_include);
            }

            for arg in &self.protoc_args {
                cmd.arg(arg);
            }

            for proto in protos {
                cmd.arg(proto.as_ref());
            }

            debug!("Running: {:?}", cmd);

            let output = match cmd.output() {
                Err(err) if ErrorKind::NotFound == err.kind() => {
                    return Err(Error::new(err.kind(), error_message_protoc_not_found()))
                }
                Err(err) => {
                    return Err(Error::new(
                        err.kind(),
                        format!(
                            "failed to invoke protoc (path: {}): {}",
                            &self.protoc_executable.display(),
                            err
                        ),
                    ))
                }
                Ok(output) => output,
            };

            if !output.status.success() {
                return Err(Error::new(
                    ErrorKind::Other,
                    format!("protoc failed: {}", String::from_utf8_lossy(&output.stderr)),
                ));
            }
        }

        let buf = fs::read(&file_descriptor_set_path).map_err(|e| {
            Error::new(
                e.kind(),
                format!(
                    "unable to open file_descriptor_set_path: {}, OS: {}",
                    file_descriptor_set_path.display(),
                    e
                ),
            )
        })?;
        let file_descriptor_set = FileDescriptorSet::decode(buf.as_slice()).map_err(|error| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("invalid FileDescriptorSet: {}", error),
            )
        })?;

        Ok(file_descriptor_set)
    }

    /// Compiles `.proto` files into Rust source, writing the result to [`Config::out_dir`] (or
    /// the `OUT_DIR` environment variable, when invoked from a `build.rs`).
    pub fn compile_protos(
        &mut self,
        protos: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
    ) -> Result<()> {
        let file_descriptor_set = self.load_fds(protos, includes)?;
        self.compile_fds(file_descriptor_set)
    }

    /// Generates Rust source from an already-loaded [`FileDescriptorSet`] and writes it to
    /// [`Config::out_dir`].
    pub fn compile_fds(&mut self, file_descriptor_set: FileDescriptorSet) -> Result<()> {
        let target = self.resolve_out_dir()?;

        let requests = file_descriptor_set
            .file
            .into_iter()
            .map(|descriptor| {
                let package_name = extract_target_package(&descriptor)
                    .unwrap_or_else(|| descriptor.package().to_string());
                let module = Module::from_protobuf_package_name(&package_name);
                (module, descriptor)
            })
            .collect::<Vec<_>>();

        let file_names = requests
            .iter()
            .map(|(module, _)| {
                (
                    module.clone(),
                    module.to_file_name_or(&self.default_package_filename),
                )
            })
            .collect::<HashMap<Module, String>>();

        let modules = self.generate(requests)?;
        for (module, content) in &modules {
            let file_name = file_names.get(module).expect("missing filename for module");
            write_file_if_changed(&target.join(file_name), content.as_bytes())?;
        }

        if let Some(ref include_file) = self.include_file {
            trace!("Writing include file: {:?}", include_file);
            let mut file = fs::File::create(target.join(include_file))?;
            self.write_includes(
                modules.keys().collect(),
                &mut file,
                None,
                &file_names,
            )?;
        }

        Ok(())
    }

    fn resolve_out_dir(&self) -> Result<PathBuf> {
        if let Some(out_dir) = &self.out_dir {
            return Ok(out_dir.clone());
        }
        match env::var("OUT_DIR") {
            Ok(val) => Ok(PathBuf::from(val)),
            Err(env::VarError::NotPresent) => Err(Error::new(
                ErrorKind::Other,
                "OUT_DIR environment variable is not set",
            )),
            Err(env::VarError::NotUnicode(..)) => Err(Error::new(
                ErrorKind::InvalidData,
                "OUT_DIR environment variable is not valid UTF-8",
            )),
        }
    }

    pub(crate) fn write_includes(
        &self,
        mut modules: Vec<&Module>,
        outfile: &mut impl Write,
        basepath: Option<&PathBuf>,
        file_names: &HashMap<Module, String>,
    ) -> Result<()> {
        modules.sort();

        let mut stack = Vec::new();

        for module in modules {
            while !module.starts_with(&stack) {
                stack.pop();
                self.write_line(outfile, stack.len(), "}")?;
            }
            while stack.len() < module.len() {
                self.write_line(
                    outfile,
                    stack.len(),
                    &format!("pub mod {} {{", module.part(stack.len())),
                )?;
                stack.push(module.part(stack.len()).to_owned());
            }

            let file_name = file_names
                .get(module)
                .expect("every module should have a filename");

            if basepath.is_some() {
                self.write_line(
                    outfile,
                    stack.len(),
                    &format!("include!(\"{}\");", file_name),
                )?;
            } else {
                self.write_line(
                    outfile,
                    stack.len(),
                    &format!("include!(concat!(env!(\"OUT_DIR\"), \"/{}\"));", file_name),
                )?;
            }
        }

        for depth in (0..stack.len()).rev() {
            self.write_line(outfile, depth, "}")?;
        }

        Ok(())
    }

    fn write_line(&self, outfile: &mut impl Write, depth: usize, line: &str) -> Result<()> {
        outfile.write_all(format!("{}{}\n", "    ".repeat(depth), line).as_bytes())
    }

    /// Processes a set of modules and file descriptors, returning a map of modules to generated
    /// code contents. Used when control over file writing should not be managed by this crate,
    /// such as in a `protoc` plugin.
    pub fn generate(
        &mut self,
        requests: Vec<(Module, FileDescriptorProto)>,
    ) -> Result<HashMap<Module, String>> {
        let mut modules = HashMap::new();

        for (_, request_fd) in &requests {
            crate::schema::check_file(request_fd)
                .map_err(|violation| Error::new(ErrorKind::InvalidInput, violation.to_string()))?;
        }

        let message_graph = MessageGraph::new(requests.iter().map(|(_, fd)| fd))
            .map_err(|error| Error::new(ErrorKind::InvalidInput, error))?;
        let extern_paths = ExternPaths::new(&self.extern_paths, self.well_known_types)
            .map_err(|error| Error::new(ErrorKind::InvalidInput, error))?;

        for (request_module, request_fd) in requests {
            let buf = modules
                .entry(request_module.clone())
                .or_insert_with(String::new);
            CodeGenerator::generate(self, &message_graph, &extern_paths, request_fd, buf);
            if buf.is_empty() {
                modules.remove(&request_module);
            }
        }

        // Generated codecs dispatch to the cursor through trait methods; bring the traits into
        // scope once per module rather than re-importing per generated item.
        for buf in modules.values_mut() {
            *buf = format!(
                "use ::protolith::cursor::{{Reader as _, Writer as _}};\n{}",
                buf
            );
        }

        #[cfg(feature = "format")]
        if self.fmt {
            for buf in modules.values_mut() {
                let file = syn::parse_file(buf).unwrap_or_else(|error| {
                    panic!("generated code failed to parse as Rust: {}\n{}", error, buf)
                });
                *buf = prettyplease::unparse(&file);
            }
        }

        self.add_generated_header(&mut modules);

        Ok(modules)
    }

    fn add_generated_header(&mut self, modules: &mut HashMap<Module, String>) {
        for buf in modules.values_mut() {
            let with_generated = "// This file is @generated by protolith-compiler.\n".to_string() + buf;
            *buf = with_generated;
        }
    }
}

/// Reads the `// <<<target_package = "a.b.c">>>` directive from a file's leading comments, if
/// present, overriding the module path the generated code is written under while leaving the
/// `.proto` package itself (used for cross-reference resolution) untouched.
fn extract_target_package(file: &FileDescriptorProto) -> Option<String> {
    let source_info = file.source_code_info.as_ref()?;
    for location in &source_info.location {
        if let Some(comments) = &location.leading_comments {
            if let Some(package) = parse_target_package_directive(comments) {
                return Some(package);
            }
        }
        for detached in &location.leading_detached_comments {
            if let Some(package) = parse_target_package_directive(detached) {
                return Some(package);
            }
        }
    }
    None
}

fn parse_target_package_directive(comment: &str) -> Option<String> {
    for line in comment.lines() {
        if let Some(value) = parse_target_package_line(line.trim()) {
            return Some(value);
        }
    }
    None
}

fn parse_target_package_line(line: &str) -> Option<String> {
    let rest = line.strip_prefix("<<<target_package")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Writes `content` as the entire contents of `path`, creating the file if necessary and
/// leaving it untouched if the contents are already correct.
fn write_file_if_changed(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let previous_content = fs::read(path);

    if previous_content
        .map(|previous_content| previous_content == content)
        .unwrap_or(false)
    {
        trace!("unchanged: {}", path.display());
        Ok(())
    } else {
        trace!("writing: {}", path.display());
        fs::write(path, content)
    }
}

impl default::Default for Config {
    fn default() -> Config {
        Config {
            file_descriptor_set_path: None,
            type_attributes: PathMap::default(),
            message_attributes: PathMap::default(),
            enum_attributes: PathMap::default(),
            field_attributes: PathMap::default(),
            boxed: PathMap::default(),
            well_known_types: true,
            strip_enum_prefix: true,
            out_dir: None,
            extern_paths: Vec::new(),
            default_package_filename: "_".to_string(),
            protoc_args: Vec::new(),
            protoc_executable: protoc_from_env(),
            disable_comments: PathMap::default(),
            skip_debug: PathMap::default(),
            skip_protoc_run: false,
            skip_source_info: false,
            include_file: None,
            #[cfg(feature = "format")]
            fmt: true,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Config")
            .field("file_descriptor_set_path", &self.file_descriptor_set_path)
            .field("type_attributes", &self.type_attributes)
            .field("field_attributes", &self.field_attributes)
            .field("well_known_types", &self.well_known_types)
            .field("strip_enum_prefix", &self.strip_enum_prefix)
            .field("out_dir", &self.out_dir)
            .field("extern_paths", &self.extern_paths)
            .field("default_package_filename", &self.default_package_filename)
            .field("protoc_args", &self.protoc_args)
            .field("disable_comments", &self.disable_comments)
            .field("skip_debug", &self.skip_debug)
            .finish()
    }
}

pub fn error_message_protoc_not_found() -> String {
    let error_msg = "Could not find `protoc`. If `protoc` is installed, try setting the `PROTOC` environment variable to the path of the `protoc` binary.";

    let os_specific_hint = if cfg!(target_os = "macos") {
        "To install it on macOS, run `brew install protobuf`."
    } else if cfg!(target_os = "linux") {
        "To install it on Debian, run `apt-get install protobuf-compiler`."
    } else {
        "Try installing `protobuf-compiler` or `protobuf` using your package manager."
    };
    let download_msg =
        "It is also available at https://github.com/protocolbuffers/protobuf/releases";

    format!("{} {} {}", error_msg, os_specific_hint, download_msg)
}

/// Returns the path to the `protoc` binary, from the `PROTOC` environment variable if set.
pub fn protoc_from_env() -> PathBuf {
    env::var_os("PROTOC")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("protoc"))
}

/// Returns the path to the Protobuf include directory, from `PROTOC_INCLUDE` if set.
pub fn protoc_include_from_env() -> Option<PathBuf> {
    let protoc_include: PathBuf = env::var_os("PROTOC_INCLUDE")?.into();

    if !protoc_include.exists() {
        panic!(
            "PROTOC_INCLUDE environment variable points to non-existent directory ({})",
            protoc_include.display()
        );
    }
    if !protoc_include.is_dir() {
        panic!(
            "PROTOC_INCLUDE environment variable points to a non-directory file ({})",
            protoc_include.display()
        );
    }

    Some(protoc_include)
}
