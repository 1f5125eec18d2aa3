fn main() -> anyhow::Result<()> {
    hand_importer_lib::run()
}
