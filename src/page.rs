// Single-page UI served at `/`.

pub(crate) const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Alt Text Generator</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #eef2f7;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
        }

        main {
            background: white;
            border-radius: 16px;
            box-shadow: 0 12px 40px rgba(20, 40, 80, 0.15);
            max-width: 720px;
            width: 100%;
            padding: 36px;
        }

        h1 { color: #1d2a3a; font-size: 1.8em; margin-bottom: 6px; }
        .subtitle { color: #5b6b7d; font-size: 0.95em; margin-bottom: 28px; }

        .drop-zone {
            border: 3px dashed #3f7fd9;
            border-radius: 12px;
            padding: 56px 20px;
            text-align: center;
            cursor: pointer;
            background: #f5f9ff;
            transition: background 0.2s, border-color 0.2s;
        }
        .drop-zone:hover, .drop-zone.dragover { background: #e6f0ff; border-color: #1f5fb8; }
        .drop-zone.disabled { pointer-events: none; opacity: 0.5; }
        .drop-title { color: #1f5fb8; font-weight: 600; font-size: 1.15em; margin-bottom: 8px; }
        .drop-hint { color: #8a97a6; font-size: 0.9em; }
        input[type="file"] { display: none; }

        .status { text-align: center; padding: 32px; display: none; color: #5b6b7d; }
        .spinner {
            border: 4px solid #e3e9f1;
            border-top: 4px solid #3f7fd9;
            border-radius: 50%;
            width: 44px;
            height: 44px;
            animation: spin 1s linear infinite;
            margin: 0 auto 16px;
        }
        @keyframes spin { to { transform: rotate(360deg); } }

        .error {
            display: none;
            margin-top: 20px;
            padding: 14px 16px;
            border-radius: 8px;
            background: #fdecec;
            color: #a12b2b;
        }

        .result { display: none; margin-top: 24px; }
        .result img { max-width: 100%; border-radius: 8px; margin-bottom: 18px; }
        .label {
            color: #3f7fd9;
            font-size: 0.8em;
            font-weight: 600;
            text-transform: uppercase;
            letter-spacing: 1px;
            margin-bottom: 8px;
        }
        .description {
            background: #f5f9ff;
            border-radius: 8px;
            padding: 16px;
            color: #1d2a3a;
            line-height: 1.6;
        }
        .meta { color: #8a97a6; font-size: 0.85em; margin-top: 10px; }
        .actions { display: flex; gap: 10px; margin-top: 16px; }
        button {
            border: none;
            border-radius: 8px;
            padding: 10px 18px;
            font-size: 0.95em;
            cursor: pointer;
            background: #3f7fd9;
            color: white;
        }
        button.secondary { background: #e3e9f1; color: #1d2a3a; }
    </style>
</head>
<body>
    <main>
        <h1>Alt Text Generator</h1>
        <p class="subtitle">Drop an image to get a screen-reader friendly description.</p>

        <div class="drop-zone" id="dropZone" role="button" tabindex="0">
            <div class="drop-title">Drop an image here or click to choose</div>
            <div class="drop-hint">PNG, JPEG, GIF or WebP</div>
            <input type="file" id="fileInput" accept="image/*">
        </div>

        <div class="status" id="status">
            <div class="spinner"></div>
            <p>Generating description...</p>
        </div>

        <div class="error" id="error" role="alert"></div>

        <section class="result" id="result">
            <img id="preview" alt="">
            <div class="label">Alt text</div>
            <div class="description" id="description"></div>
            <div class="meta"><span id="model"></span> &middot; <span id="elapsed"></span> ms</div>
            <div class="actions">
                <button id="copyButton">Copy to clipboard</button>
                <button id="resetButton" class="secondary">Start over</button>
            </div>
        </section>
    </main>

    <script>
        const dropZone = document.getElementById('dropZone');
        const fileInput = document.getElementById('fileInput');
        const statusBox = document.getElementById('status');
        const errorBox = document.getElementById('error');
        const result = document.getElementById('result');
        const preview = document.getElementById('preview');
        const description = document.getElementById('description');
        const model = document.getElementById('model');
        const elapsed = document.getElementById('elapsed');
        const copyButton = document.getElementById('copyButton');
        const resetButton = document.getElementById('resetButton');
        let busy = false;

        dropZone.addEventListener('click', () => fileInput.click());
        dropZone.addEventListener('keydown', (e) => {
            if (e.key === 'Enter' || e.key === ' ') fileInput.click();
        });
        dropZone.addEventListener('dragover', (e) => {
            e.preventDefault();
            dropZone.classList.add('dragover');
        });
        dropZone.addEventListener('dragleave', () => dropZone.classList.remove('dragover'));
        dropZone.addEventListener('drop', (e) => {
            e.preventDefault();
            dropZone.classList.remove('dragover');
            const file = e.dataTransfer.files[0];
            if (file && file.type.startsWith('image/')) describe(file);
        });
        fileInput.addEventListener('change', (e) => {
            const file = e.target.files[0];
            if (file) describe(file);
        });

        copyButton.addEventListener('click', async () => {
            try {
                await navigator.clipboard.writeText(description.textContent);
                copyButton.textContent = 'Copied!';
            } catch (_) {
                copyButton.textContent = 'Copy failed';
            }
            setTimeout(() => { copyButton.textContent = 'Copy to clipboard'; }, 1500);
        });

        resetButton.addEventListener('click', reset);

        function reset() {
            result.style.display = 'none';
            errorBox.style.display = 'none';
            statusBox.style.display = 'none';
            dropZone.style.display = 'block';
            dropZone.classList.remove('disabled');
            fileInput.value = '';
            preview.removeAttribute('src');
            description.textContent = '';
        }

        function showError(message) {
            errorBox.textContent = message;
            errorBox.style.display = 'block';
        }

        async function describe(file) {
            if (busy) return;
            busy = true;

            reset();
            dropZone.classList.add('disabled');
            dropZone.style.display = 'none';
            statusBox.style.display = 'block';

            const reader = new FileReader();
            reader.onload = (e) => { preview.src = e.target.result; };
            reader.readAsDataURL(file);

            const form = new FormData();
            form.append('image', file);

            try {
                const response = await fetch('/api/describe', { method: 'POST', body: form });
                const body = await response.json().catch(() => ({}));
                if (!response.ok) {
                    throw new Error(body.error || 'Something went wrong. Please try again.');
                }

                statusBox.style.display = 'none';
                description.textContent = body.description;
                preview.alt = body.description;
                model.textContent = body.model;
                elapsed.textContent = body.processing_time_ms;
                result.style.display = 'block';
            } catch (err) {
                statusBox.style.display = 'none';
                dropZone.style.display = 'block';
                dropZone.classList.remove('disabled');
                showError(err.message);
            } finally {
                busy = false;
            }
        }
    </script>
</body>
</html>
"#;
