//! Tests for form encoding and decoding.

use super::{
    BuildError, FilePart, FormField, ParamValue, Params, decode_form, encode_form, flatten,
};

fn order_params() -> Params {
    Params::new()
        .with("amount", 2000)
        .with("currency", "usd")
        .with("capture", false)
        .with("metadata", Params::new().with("order", "6735").with("note", "a&b=c"))
        .with(
            "items",
            vec![
                Params::new().with("price", "p_1").with("quantity", 2),
                Params::new().with("price", "p_2").with("quantity", 1),
            ],
        )
        .with("expand", vec!["customer", "invoice"])
}

mod encoding {
    use super::*;

    #[test]
    fn nested_map_uses_brackets() {
        let params = Params::new().with("metadata", Params::new().with("order", "1"));

        assert_eq!(encode_form(&params).unwrap(), "metadata[order]=1");
    }

    #[test]
    fn list_of_maps_uses_indices() {
        let params = Params::new().with(
            "items",
            vec![Params::new().with("price", "p_1"), Params::new().with("price", "p_2")],
        );

        assert_eq!(
            encode_form(&params).unwrap(),
            "items[0][price]=p_1&items[1][price]=p_2"
        );
    }

    #[test]
    fn scalars_render_as_text() {
        let params = Params::new()
            .with("amount", 2000)
            .with("ratio", 0.5)
            .with("capture", true)
            .with("description", ParamValue::Null);

        assert_eq!(
            encode_form(&params).unwrap(),
            "amount=2000&ratio=0.5&capture=true&description="
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let params = Params::new().with("q", "a&b=c d");

        assert_eq!(encode_form(&params).unwrap(), "q=a%26b%3Dc+d");
    }

    #[test]
    fn empty_containers_send_empty_value() {
        let params = Params::new()
            .with("metadata", Params::new())
            .with("expand", Vec::<String>::new());

        assert_eq!(encode_form(&params).unwrap(), "metadata=&expand=");
    }

    #[test]
    fn order_is_preserved() {
        let params = Params::new().with("z", "1").with("a", "2").with("m", "3");

        assert_eq!(encode_form(&params).unwrap(), "z=1&a=2&m=3");
    }

    #[test]
    fn files_are_rejected_in_form_bodies() {
        let params = Params::new().with("file", FilePart::new("a.txt", "x"));

        assert!(matches!(
            encode_form(&params),
            Err(BuildError::InvalidParam(_))
        ));
    }

    #[test]
    fn flatten_keeps_files_as_file_fields() {
        let params = Params::new()
            .with("purpose", "identity_document")
            .with("file", FilePart::new("id.png", vec![1u8, 2, 3]));

        let fields = flatten(&params);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key(), "purpose");
        assert!(matches!(fields[1], FormField::File { .. }));
    }
}

mod decoding {
    use super::*;

    #[test]
    fn round_trip_restores_structure() {
        let params = order_params();

        let decoded = decode_form(&encode_form(&params).unwrap()).unwrap();

        assert_eq!(decoded, params.stringified());
    }

    #[test]
    fn decodes_percent_encoded_brackets() {
        let decoded = decode_form("metadata%5Border%5D=1").unwrap();

        assert_eq!(
            decoded,
            Params::new().with("metadata", Params::new().with("order", "1"))
        );
    }

    #[test]
    fn empty_brackets_append_to_list() {
        let decoded = decode_form("expand[]=a&expand[]=b").unwrap();

        assert_eq!(decoded, Params::new().with("expand", vec!["a", "b"]));
    }

    #[test]
    fn index_past_end_starts_a_map() {
        let decoded = decode_form("items[2]=x").unwrap();

        assert_eq!(decoded, Params::new().with("items", Params::new().with("2", "x")));
    }

    #[test]
    fn numeric_map_key_round_trips() {
        let params = Params::new().with("metadata", Params::new().with("1", "x"));

        let encoded = encode_form(&params).unwrap();

        assert_eq!(encoded, "metadata[1]=x");
        assert_eq!(decode_form(&encoded).unwrap(), params);
    }

    #[test]
    fn zero_key_then_named_key_becomes_a_map() {
        let params = Params::new().with(
            "metadata",
            Params::new().with("0", "first").with("tier", "gold"),
        );

        let decoded = decode_form(&encode_form(&params).unwrap()).unwrap();

        assert_eq!(decoded, params);
    }

    #[test]
    fn sole_zero_key_reads_as_a_list() {
        let params = Params::new().with("metadata", Params::new().with("0", "x"));

        let encoded = encode_form(&params).unwrap();
        let decoded = decode_form(&encoded).unwrap();

        assert_eq!(decoded, Params::new().with("metadata", vec!["x"]));
        assert_eq!(encode_form(&decoded).unwrap(), encoded);
    }

    #[test]
    fn leading_zero_is_a_map_key() {
        let decoded = decode_form("metadata[01]=x").unwrap();

        assert_eq!(decoded, Params::new().with("metadata", Params::new().with("01", "x")));
    }

    #[test]
    fn scalar_then_container_conflict_is_rejected() {
        assert!(decode_form("metadata=x&metadata[a]=1").is_err());
    }

    #[test]
    fn malformed_brackets_are_literal_keys() {
        let decoded = decode_form("a[b=1").unwrap();

        assert_eq!(decoded.get("a[b"), Some(&ParamValue::String("1".to_string())));
    }

    #[test]
    fn empty_input_is_empty_params() {
        assert!(decode_form("").unwrap().is_empty());
    }
}
