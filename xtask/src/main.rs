/// Packages the plugin through nih_plug_xtask's `bundle` subcommand:
///
///   cargo xtask bundle console-fx --release
///
/// The bundles land in `target/bundled/Console FX.{vst3,clap}`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
