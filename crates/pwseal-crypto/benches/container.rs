use pwseal_crypto::{decrypt, derive_key, encrypt, DerivedKey, EncryptOptions};
use secrecy::SecretString;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn options() -> EncryptOptions {
    // Low iteration count so the chunk pipeline, not PBKDF2, dominates.
    EncryptOptions {
        iterations: 1000,
        ..EncryptOptions::default()
    }
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let password = SecretString::from("bench-password");
    let data = make_data(size);
    let opts = options();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt(
                divan::black_box(&data),
                "bench.bin",
                &password,
                None,
                &opts,
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let password = SecretString::from("bench-password");
    let container = encrypt(&make_data(size), "bench.bin", &password, None, &options()).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| decrypt(divan::black_box(&container), &password, None).unwrap());
}

#[divan::bench(args = [1000, 200_000])]
fn bench_derive_key(iterations: u32) -> DerivedKey {
    let password = SecretString::from("bench-password");
    derive_key(&password, divan::black_box(&[7u8; 16]), iterations)
}

fn main() {
    divan::main();
}
