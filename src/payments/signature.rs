use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"`, as Razorpay signs checkout callbacks.
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts keys of any length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let expected = expected_signature(secret, order_id, payment_id);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_digests() {
        assert_eq!(
            expected_signature("secret", "order_1", "pay_1"),
            "52115a0d3400de9e86aade1f1b6eba9e8974604f4e267a9e9a16633a4c8dd2cb"
        );
        assert_eq!(
            expected_signature("rzp_test_secret", "order_IluGWxBm9U8zJ8", "pay_IluGWxBm9U8zJ9"),
            "3203fe3b01bd3ee61127313802a162a26c7da5f73a0f3c1cb9252fd2fe224bc9"
        );
    }

    #[test]
    fn pipe_separator_is_part_of_the_message() {
        // HMAC-SHA256("secret", "order_1pay_1"), i.e. the same ids without the separator
        let unseparated = "47d3ab98a0caa768385de222208009ae3068ee1a424907cd27b91f29bb40442e";
        assert_ne!(expected_signature("secret", "order_1", "pay_1"), unseparated);
        assert!(!verify_signature("secret", "order_1", "pay_1", unseparated));
    }

    #[test]
    fn verify_accepts_only_exact_signature() {
        let sig = expected_signature("secret", "order_1", "pay_1");
        assert!(verify_signature("secret", "order_1", "pay_1", &sig));
        assert!(!verify_signature("secret", "order_1", "pay_2", &sig));
        assert!(!verify_signature("other", "order_1", "pay_1", &sig));
        assert!(!verify_signature("secret", "order_1", "pay_1", &sig.to_uppercase()));
        assert!(!verify_signature("secret", "order_1", "pay_1", &sig[..10]));
        assert!(!verify_signature("secret", "order_1", "pay_1", ""));
    }
}
