fn main() {
    println!("cargo:rerun-if-env-changed=VOCODEC_LIB_DIR");
    if let Ok(dir) = std::env::var("VOCODEC_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }
    println!("cargo:rustc-link-search=native=/opt/homebrew/lib");
    println!("cargo:rustc-link-lib=opus");
    println!("cargo:rustc-link-lib=speex");
    println!("cargo:rustc-link-lib=speexdsp");
}
