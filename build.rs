fn main() {
    // cfg.toml が無い場合は toml_cfg のデフォルト値が使われる
    if !std::path::Path::new("cfg.toml").exists() {
        println!("cargo:warning=cfg.toml が見つかりません。cfg.toml.example をコピーして設定してください");
    }
    println!("cargo:rerun-if-changed=cfg.toml");

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
