fn main() {
    // ESP-IDF のリンク設定はターゲットがESP-IDFの場合のみ
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
